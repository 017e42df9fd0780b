//! Entry point for `find-base-branch`.
//!
//! Prints the resolved base branch on stdout and exits 0, or prints an error
//! on stderr and exits 1.

use gitkit::cli::FindBaseBranchCli;
use gitkit::commands;
use gitkit::logging::{self, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = FindBaseBranchCli::parse_args();
    logging::init(Verbosity::from_debug_flag(cli.debug));

    match commands::cmd_find_base_branch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
