//! `safe-rm` command implementation.

use crate::backend::{GitBackend, VcsBackend};
use crate::cli::SafeRmCli;
use crate::config::Config;
use crate::error::Result;
use crate::remover::{Action, RemovalReport, RemoveOptions, SafeRemover};
use std::path::Path;

/// Where a report line is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Stdout(String),
    Stderr(String),
}

/// Remove the requested paths relative to the current directory.
///
/// Each action is reported as soon as it happens, so a failure part-way
/// still leaves a record of what was already removed or backed up.
pub fn cmd_safe_rm(args: SafeRmCli) -> Result<()> {
    let backend = GitBackend::from_current_dir()?;
    safe_rm(&backend, backend.cwd(), &args, |line| match line {
        Line::Stdout(text) => println!("{}", text),
        Line::Stderr(text) => eprintln!("{}", text),
    })?;
    Ok(())
}

/// Run a removal, passing the user-facing line of every action to `emit`.
pub(crate) fn safe_rm<B, F>(
    backend: &B,
    cwd: &Path,
    args: &SafeRmCli,
    mut emit: F,
) -> Result<RemovalReport>
where
    B: VcsBackend + ?Sized,
    F: FnMut(Line),
{
    let repo_root = backend.repo_root()?;
    let config = Config::load_for_repo(&repo_root)?;

    let options = RemoveOptions {
        recursive: args.recursive,
    };
    let remover = SafeRemover::new(backend, &config, cwd, options)?;
    remover.remove_with(&args.paths, |action| {
        if let Some(line) = describe(action, args) {
            emit(line);
        }
    })
}

/// The user-facing line for an action, if any.
///
/// Warnings always go to stderr; per-file progress only with `--verbose`.
pub(crate) fn describe(action: &Action, args: &SafeRmCli) -> Option<Line> {
    match action {
        Action::Missing(path) if !args.force => Some(Line::Stderr(format!(
            "Warning: '{}' does not exist",
            path.display()
        ))),
        Action::Missing(_) => None,
        Action::KeptDirectory(path) => Some(Line::Stderr(format!(
            "Warning: directory '{}' was not empty and was kept",
            path.display()
        ))),
        Action::NestedRepository(path) => Some(Line::Stderr(format!(
            "Warning: '{}' is a nested git repository, left in place",
            path.display()
        ))),
        _ if !args.verbose => None,
        Action::Deleted(path) => Some(Line::Stdout(format!("removed '{}'", path.display()))),
        Action::BackedUp { original, backup } => Some(Line::Stdout(format!(
            "backed up '{}' -> '{}'",
            original.display(),
            backup.display()
        ))),
        Action::AlreadyBackedUp { original, backup } => Some(Line::Stdout(format!(
            "removed '{}' (already backed up as '{}')",
            original.display(),
            backup.display()
        ))),
        Action::RemovedDirectory(path) => Some(Line::Stdout(format!(
            "removed directory '{}'",
            path.display()
        ))),
    }
}
