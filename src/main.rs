//! # datashelf command-line entry point
//!
//! Parses arguments, sets up logging and dispatches to the handlers in
//! `cli.rs`. Every handler resolves the project from the current directory,
//! except `init`, which creates it.
//!
//! ```bash
//! datashelf init --yes
//! datashelf create-collection "Sales 2024"
//! datashelf save q1.csv --collection "Sales 2024" --name q1 --tag raw -m "first extract"
//! datashelf ls coll-files --collection "Sales 2024"
//! ```
//!
//! Errors are logged, printed to stderr and turn into exit code 1.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::Parser as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = datashelf::logging::init(cli.verbose) {
        // Console output still works without the subscriber.
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match cli::run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
