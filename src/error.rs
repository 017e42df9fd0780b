//! Error types for gitkit.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Every variant is fatal for the invocation that produced it; recoverable
//! conditions (missing paths, inapplicable strategies) never become errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for gitkit operations.
#[derive(Error, Debug)]
pub enum GitkitError {
    /// The working directory is not inside a git work tree.
    #[error("Not in a git repository")]
    NotInRepository,

    /// A target path resolves outside the repository root.
    #[error("'{}' is outside the git repository", .0.display())]
    OutsideRepository(PathBuf),

    /// A directory was targeted without recursive mode.
    #[error("'{}' is a directory (use -r to remove directories)", .0.display())]
    DirectoryWithoutRecursive(PathBuf),

    /// A target path must never be removed (repository root, `.git`, backup mirror).
    #[error("refusing to remove '{}': {reason}", .path.display())]
    ProtectedPath { path: PathBuf, reason: String },

    /// No base branch strategy succeeded.
    #[error("could not determine base branch")]
    NoBaseBranch,

    /// The configuration file could not be read, parsed, or validated.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    Git(String),

    /// Filesystem operation failed.
    #[error("{0}")]
    Io(String),
}

impl GitkitError {
    /// Build an I/O error that names the operation and the path involved.
    pub fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
        GitkitError::Io(format!("failed to {} '{}': {}", action, path.display(), err))
    }

    pub fn protected(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GitkitError::ProtectedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for gitkit operations.
pub type Result<T> = std::result::Result<T, GitkitError>;
