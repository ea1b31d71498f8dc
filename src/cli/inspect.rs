//! Inspect command: print the descriptor of a DMI

use std::process::ExitCode;

use crate::convert::{read_source, SheetSource};
use crate::descriptor::{parse_descriptor, AttributeValue, Descriptor};
use crate::dmi::read_description;
use crate::error::{ConvertError, Result};

use super::{exit_code_for, EXIT_ERROR, EXIT_SUCCESS};

fn load_descriptor(source: &SheetSource) -> Result<Descriptor> {
    let bytes = read_source(source)?;
    if !crate::dmi::is_png(&bytes) {
        return Err(ConvertError::UnsupportedInput(format!("{} is not a PNG image", source.describe())));
    }
    parse_descriptor(&read_description(&bytes)?)
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Integer(n) => n.to_string(),
        AttributeValue::List(items) => items.iter().map(f64::to_string).collect::<Vec<_>>().join(","),
    }
}

/// Human readable state table.
pub(crate) fn format_text(descriptor: &Descriptor) -> String {
    let mut out = format!(
        "version {}, cell {}x{}, {} states, {} cells\n",
        descriptor.version,
        descriptor.width,
        descriptor.height,
        descriptor.states.len(),
        descriptor.total_cells()
    );
    for state in &descriptor.states {
        out.push_str(&format!("  {:?}: {} dirs x {} frames", state.name, state.dirs, state.frames));
        if let Some(delay) = &state.delay {
            let delays: Vec<String> = delay.iter().map(f64::to_string).collect();
            out.push_str(&format!(", delay {}", delays.join(",")));
        }
        for attribute in &state.extra {
            out.push_str(&format!(", {} {}", attribute.key, format_value(&attribute.value)));
        }
        out.push('\n');
    }
    out
}

/// Execute the inspect command
pub fn run_inspect(source: &str, json: bool) -> ExitCode {
    let source = SheetSource::parse(source);
    let descriptor = match load_descriptor(&source) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(exit_code_for(&e));
        }
    };

    if json {
        match serde_json::to_string_pretty(&descriptor) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print!("{}", format_text(&descriptor));
    }
    ExitCode::from(EXIT_SUCCESS)
}
