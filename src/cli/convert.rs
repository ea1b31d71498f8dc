//! Conversion command implementations (convert, split)

use std::path::Path;
use std::process::ExitCode;

use crate::config::RsikitConfig;
use crate::convert::{convert_many, convert_one, ConvertOptions, SheetSource};

use super::{exit_code_for, EXIT_SUCCESS};

fn options_from(config: &RsikitConfig, icons: Option<&str>) -> ConvertOptions {
    ConvertOptions {
        copyright: config.defaults.copyright.clone(),
        license: config.defaults.license.clone(),
        version: config.defaults.version,
        icons: icons.map(SheetSource::parse),
        assets: config.split.assets.clone(),
    }
}

/// Execute the convert command
pub fn run_convert(source: &str, output: &Path, config: &RsikitConfig) -> ExitCode {
    let source = SheetSource::parse(source);
    match convert_one(&source, output, &options_from(config, None)) {
        Ok(rsi) => {
            println!("{} ({} states)", output.display(), rsi.state_names().len());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Execute the split command
pub fn run_split(source: &str, output: &Path, icons: Option<&str>, config: &RsikitConfig) -> ExitCode {
    let source = SheetSource::parse(source);
    match convert_many(&source, output, config.split.mode, &options_from(config, icons)) {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path.display());
            }
            if paths.is_empty() {
                eprintln!("Warning: no groups could be built in {} mode", config.split.mode);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
