//! Command implementations for gitkit.
//!
//! Each binary parses its own arguments and hands them to one handler here.
//! Handlers return `Result<()>`; the binaries turn errors into `Error: ...`
//! on stderr and a failing exit status.

mod base_branch;
mod safe_rm;

pub use base_branch::cmd_find_base_branch;
pub use safe_rm::cmd_safe_rm;
