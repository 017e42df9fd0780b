//! Entry point for `safe-rm`.
//!
//! Exits 0 when every existing path was handled (missing paths only warn),
//! 1 on any refusal or failure.

use gitkit::cli::SafeRmCli;
use gitkit::commands;
use gitkit::logging::{self, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = SafeRmCli::parse_args();
    logging::init(Verbosity::from_debug_flag(cli.debug));

    match commands::cmd_safe_rm(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
