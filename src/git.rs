//! Git command runner for gitkit.
//!
//! Every git subprocess goes through [`run_git`], which captures trimmed
//! output and turns failures into [`GitkitError::Git`].

use crate::error::{GitkitError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Returns true if stdout is empty.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }

    /// Returns non-empty stdout lines, trimmed.
    pub fn lines(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Run `git <args>` from `cwd`.
///
/// Pathspecs are always interpreted literally, so file names containing
/// glob characters match only themselves. A non-zero exit becomes
/// [`GitkitError::Git`] carrying git's own message (stderr, falling back to
/// stdout).
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let subcommand = args.first().copied().unwrap_or("");

    let output = Command::new("git")
        .current_dir(cwd.as_ref())
        .arg("--literal-pathspecs")
        .args(args)
        .output()
        .map_err(|e| GitkitError::Git(format!("failed to execute git {}: {}", subcommand, e)))?;

    let captured = GitOutput::from_output(&output);
    if output.status.success() {
        return Ok(captured);
    }

    let message = match captured.stderr.as_str() {
        "" => captured.stdout.as_str(),
        stderr => stderr,
    };
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    Err(GitkitError::Git(format!(
        "git {} exited with {}: {}",
        subcommand, code, message
    )))
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// Any failure (git missing, not a work tree, bare repository) is reported
/// as [`GitkitError::NotInRepository`].
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let output = run_git(cwd, &["rev-parse", "--show-toplevel"]).map_err(|e| {
        tracing::debug!("repository detection failed: {}", e);
        GitkitError::NotInRepository
    })?;

    if output.is_empty() {
        return Err(GitkitError::NotInRepository);
    }
    Ok(PathBuf::from(&output.stdout))
}
