//! Seqlog: shared log of sequencing data directories.
//!
//! This is the main entry point for the `seqlog` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and maps
//! errors to distinct exit codes.

mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod log;
pub mod target;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return the exit code for this error kind
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
