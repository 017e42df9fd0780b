//! `find-base-branch` command implementation.

use crate::backend::{GitBackend, VcsBackend};
use crate::cli::FindBaseBranchCli;
use crate::config::Config;
use crate::error::{GitkitError, Result};
use crate::resolver::BaseBranchResolver;

/// Resolve the base branch of the current directory's repository and print it.
pub fn cmd_find_base_branch(args: FindBaseBranchCli) -> Result<()> {
    let backend = GitBackend::from_current_dir()?;
    let output = find_base_branch(&backend, &args)?;
    println!("{}", output);
    Ok(())
}

/// Resolve the base branch and render the line to print on stdout.
pub(crate) fn find_base_branch<B: VcsBackend + ?Sized>(
    backend: &B,
    args: &FindBaseBranchCli,
) -> Result<String> {
    let repo_root = backend.repo_root()?;
    let config = Config::load_for_repo(&repo_root)?;

    let resolver = BaseBranchResolver::new(backend, &config);
    if args.fetch {
        resolver.refresh();
    }

    let base = resolver.resolve().ok_or(GitkitError::NoBaseBranch)?;
    if args.json {
        serde_json::to_string(&base)
            .map_err(|e| GitkitError::Io(format!("failed to serialize result: {}", e)))
    } else {
        Ok(base.name)
    }
}
