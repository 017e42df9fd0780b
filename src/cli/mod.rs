//! CLI argument parsing for gitkit.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Each binary has its own top-level parser; the handlers live in the
//! `commands` module.

use clap::Parser;
use std::path::PathBuf;

/// Print the most plausible base branch of the current branch.
///
/// Strategies, in order: the configured upstream, common default branch
/// names on the primary remote, the closest remote branch by commit
/// distance, and the primary remote's HEAD.
#[derive(Parser, Debug)]
#[command(name = "find-base-branch")]
#[command(author, version, about, long_about = None)]
pub struct FindBaseBranchCli {
    /// Show how the base branch is determined (on stderr).
    #[arg(long, visible_alias = "verbose", short = 'v')]
    pub debug: bool,

    /// Fetch latest remote refs before determining the base branch.
    #[arg(long)]
    pub fetch: bool,

    /// Print a JSON object with the branch and the strategy that found it.
    #[arg(long)]
    pub json: bool,
}

/// Remove files, keeping a backup of anything git cannot restore.
///
/// Tracked files identical to HEAD are deleted. Untracked and modified
/// files are moved to .safe-rm/ at the repository root, named with a short
/// hash of their content.
#[derive(Parser, Debug)]
#[command(name = "safe-rm")]
#[command(author, version, about, long_about = None)]
pub struct SafeRmCli {
    /// Remove directories and their contents recursively.
    #[arg(short = 'r', short_alias = 'R', long)]
    pub recursive: bool,

    /// Do not warn about nonexistent files.
    #[arg(short, long)]
    pub force: bool,

    /// Explain what is being done.
    #[arg(short, long)]
    pub verbose: bool,

    /// Show git queries and classification decisions (on stderr).
    #[arg(long)]
    pub debug: bool,

    /// Files or directories to remove.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

impl FindBaseBranchCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl SafeRmCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
