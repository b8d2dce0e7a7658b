//! Command-line interface.
//!
//! Flags only, no subcommands. Arguments that do not parse print the long
//! help instead of an error, so a mistyped scheduler entry never fails loudly.

mod commands;
mod output;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
pub use commands::Cli;

use crate::error::ApodError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the requested command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), ApodError> {
    match Cli::try_parse() {
        Ok(cli) => cli.execute(),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {}", crate::constants::APP_NAME, err.kind());
            Cli::command().print_long_help()?;
            Ok(())
        }
    }
}
