//! Validate command: open RSI bundles and check their states

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::error::Result;
use crate::rsi::Rsi;

use super::{find_bundles, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

fn check_bundle(path: &Path) -> Result<Rsi> {
    let rsi = Rsi::open(path)?;
    rsi.validate()?;
    Ok(rsi)
}

/// Execute the validate command
pub fn run_validate(args: &[PathBuf]) -> ExitCode {
    let bundles = find_bundles(args);
    if bundles.is_empty() {
        eprintln!("Error: No bundles to validate");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut failed = 0;
    for path in &bundles {
        match check_bundle(path) {
            Ok(rsi) => println!("{}: ok ({} states)", path.display(), rsi.state_names().len()),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} bundles failed validation", failed, bundles.len());
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
