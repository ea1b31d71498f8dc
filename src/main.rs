//! rsikit - Command-line tool for converting DMI sprite sheets into RSI bundles

use std::process::ExitCode;

use rsikit::cli;

fn main() -> ExitCode {
    cli::run()
}
