//! The loxtest command-line interface.
//!
//! Parses arguments, sets up logging, and maps the run to an exit status:
//! 0 when every script passed, 1 when any failed or the run aborted, 2 for
//! a usage error.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use termcolor::StandardStream;

use crate::cli::args::HarnessArgs;
use crate::harness;
use crate::report::Reporter;

pub mod args;
pub mod logging;

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = match HarnessArgs::try_parse() {
        Ok(args) => args,
        Err(err) => return usage_error(err),
    };
    logging::init();

    let config = args.config();
    let mut reporter = Reporter::new(StandardStream::stdout(args.color.choice()));
    match harness::run_all(&config, &mut reporter) {
        Ok(summary) if summary.all_passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FAILURE),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Usage problems go to stdout before any script runs.
fn usage_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            println!("{}", err.render());
            ExitCode::from(EXIT_USAGE)
        }
    }
}
