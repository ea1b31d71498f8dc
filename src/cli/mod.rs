//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod convert;
mod inspect;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use glob::glob;

use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::error::ConvertError;
use crate::output::is_bundle_path;
use crate::split::GroupingMode;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Exit code for a failed conversion: bad input is an argument problem.
pub(crate) fn exit_code_for(err: &ConvertError) -> u8 {
    match err {
        ConvertError::UnsupportedInput(_) | ConvertError::InvalidBundlePath(_) => EXIT_INVALID_ARGS,
        _ => EXIT_ERROR,
    }
}

/// Expand bundle arguments: directories that are not bundles themselves are
/// searched recursively for `*.rsi`, glob patterns are expanded.
pub fn find_bundles(args: &[PathBuf]) -> Vec<PathBuf> {
    let mut bundles = Vec::new();
    for arg in args {
        let pattern = if arg.is_dir() && !is_bundle_path(arg) {
            format!("{}/**/*.rsi", arg.display())
        } else {
            arg.display().to_string()
        };
        match glob(&pattern) {
            Ok(paths) => {
                let before = bundles.len();
                bundles.extend(paths.filter_map(Result::ok).filter(|p| p.is_dir()));
                // Keep literal paths so missing bundles are reported
                if bundles.len() == before && !arg.is_dir() {
                    bundles.push(arg.clone());
                }
            }
            Err(_) => bundles.push(arg.clone()),
        }
    }
    bundles
}

/// rsikit - Convert BYOND DMI sprite sheets into RSI bundles
#[derive(Parser)]
#[command(name = "rsikit")]
#[command(about = "rsikit - Convert BYOND DMI sprite sheets into RSI bundles")]
#[command(version)]
pub struct Cli {
    /// Config file (default: rsikit.toml found from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log progress; RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a DMI into a single RSI bundle
    Convert {
        /// DMI file path or http(s) URL
        source: String,

        /// Bundle directory to create (must end in .rsi)
        output: PathBuf,

        /// Copyright notice (default: config, or the URL for remote sources)
        #[arg(long)]
        copyright: Option<String>,

        /// License identifier (default: config, or CC-BY-SA-3.0)
        #[arg(long)]
        license: Option<String>,
    },

    /// Split a DMI into one RSI bundle per group of states
    Split {
        /// DMI file path or http(s) URL
        source: String,

        /// Directory that receives the bundles
        output: PathBuf,

        /// Grouping mode (default: config, or auto)
        #[arg(short, long, value_enum)]
        mode: Option<GroupingMode>,

        /// Copyright notice
        #[arg(long)]
        copyright: Option<String>,

        /// License identifier
        #[arg(long)]
        license: Option<String>,

        /// Companion DMI with inventory icons, matched by state name
        #[arg(long)]
        icons: Option<String>,

        /// Directory of reference images (inhand-left.png, inhand-right.png)
        #[arg(long)]
        assets: Option<PathBuf>,
    },

    /// Print the state table of a DMI
    Inspect {
        /// DMI file path or http(s) URL
        source: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check RSI bundles for missing images and bad dimensions
    Validate {
        /// Bundles, directories containing bundles, or glob patterns
        #[arg(required = true)]
        bundles: Vec<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match cli.command {
        Commands::Convert { source, output, copyright, license } => {
            merge_cli_overrides(
                &mut config,
                &CliOverrides { license, copyright, ..Default::default() },
            );
            convert::run_convert(&source, &output, &config)
        }
        Commands::Split { source, output, mode, copyright, license, icons, assets } => {
            merge_cli_overrides(&mut config, &CliOverrides { license, copyright, mode, assets });
            convert::run_split(&source, &output, icons.as_deref(), &config)
        }
        Commands::Inspect { source, json } => inspect::run_inspect(&source, json),
        Commands::Validate { bundles } => validate::run_validate(&bundles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_split() {
        let cli = Cli::try_parse_from([
            "rsikit", "split", "guns.dmi", "out", "--mode", "ammo-box", "--assets", "refs", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Split { mode, assets, icons, .. } => {
                assert_eq!(mode, Some(GroupingMode::AmmoBox));
                assert_eq!(assets, Some(PathBuf::from("refs")));
                assert_eq!(icons, None);
            }
            _ => panic!("expected split"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["rsikit", "split", "a.dmi", "out", "--mode", "hat"]).is_err());
        assert!(Cli::try_parse_from(["rsikit", "validate"]).is_err());
    }

    #[test]
    fn test_find_bundles() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a.rsi")).unwrap();
        fs::create_dir_all(temp.path().join("nested").join("b.rsi")).unwrap();
        fs::create_dir_all(temp.path().join("plain")).unwrap();

        let mut found = find_bundles(&[temp.path().to_path_buf()]);
        found.sort();
        assert_eq!(found, [temp.path().join("a.rsi"), temp.path().join("nested").join("b.rsi")]);

        let direct = temp.path().join("a.rsi");
        assert_eq!(find_bundles(&[direct.clone()]), [direct]);

        let missing = temp.path().join("missing.rsi");
        assert_eq!(find_bundles(&[missing.clone()]), [missing]);
    }

    #[test]
    fn test_exit_codes() {
        let bad_input = ConvertError::UnsupportedInput("x".to_string());
        assert_eq!(exit_code_for(&bad_input), EXIT_INVALID_ARGS);
        let bounds = ConvertError::BoundsError("x".to_string());
        assert_eq!(exit_code_for(&bounds), EXIT_ERROR);
    }
}
