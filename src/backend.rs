//! Version-control backend abstraction.
//!
//! The resolver and the remover only talk to git through [`VcsBackend`], so
//! their decision logic can be exercised against an in-memory fake. The real
//! implementation, [`GitBackend`], shells out through [`crate::git::run_git`].
//!
//! Query methods return `Result` so callers can log why a query failed; the
//! callers decide whether a failure is fatal (it almost never is).

use crate::error::{GitkitError, Result};
use crate::git::{get_repo_root, run_git};
use std::path::{Path, PathBuf};

/// Working-tree status of a single existing file, relative to `HEAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Not in the index (includes ignored files).
    Untracked,
    /// Tracked and identical to the last commit, both in the index and on disk.
    Unmodified,
    /// Tracked with staged or unstaged changes, or added but never committed.
    Modified,
}

impl PathStatus {
    /// Parse the first line of `git status --porcelain` output for one path.
    ///
    /// Empty output means git has nothing to report, i.e. the file matches `HEAD`.
    pub fn from_porcelain(output: &str) -> Self {
        let first = output.lines().map(str::trim).find(|l| !l.is_empty());
        match first {
            None => PathStatus::Unmodified,
            Some(line) if line.starts_with("??") || line.starts_with("!!") => PathStatus::Untracked,
            Some(_) => PathStatus::Modified,
        }
    }
}

/// The git capabilities gitkit relies on.
pub trait VcsBackend {
    /// Absolute path of the work tree root.
    fn repo_root(&self) -> Result<PathBuf>;

    /// Name of the checked-out branch; `Ok(None)` on a detached `HEAD`.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Short name of the current branch's configured upstream (`origin/main`).
    fn upstream(&self) -> Result<String>;

    /// Configured remote names.
    fn remotes(&self) -> Result<Vec<String>>;

    /// Remote-tracking branches of `remote` as `remote/branch`, in ref order.
    fn remote_branches(&self, remote: &str) -> Result<Vec<String>>;

    /// Whether `reference` resolves to a commit.
    fn ref_exists(&self, reference: &str) -> bool;

    /// Merge base of two revisions.
    fn merge_base(&self, a: &str, b: &str) -> Result<String>;

    /// Number of commits reachable from `head` but not from `base`.
    fn commit_count(&self, base: &str, head: &str) -> Result<u64>;

    /// Full ref name a symbolic ref points to.
    fn symbolic_ref(&self, name: &str) -> Result<String>;

    /// Refresh remote-tracking refs.
    fn fetch(&self) -> Result<()>;

    /// Status of an existing file inside the work tree.
    fn path_status(&self, path: &Path) -> Result<PathStatus>;
}

/// [`VcsBackend`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitBackend {
    cwd: PathBuf,
}

impl GitBackend {
    /// Create a backend that runs every git command from `cwd`.
    pub fn new<P: Into<PathBuf>>(cwd: P) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Create a backend rooted at the process working directory.
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| GitkitError::Io(format!("failed to get current working directory: {}", e)))?;
        Ok(Self::new(cwd))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl VcsBackend for GitBackend {
    fn repo_root(&self) -> Result<PathBuf> {
        get_repo_root(&self.cwd)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let output = run_git(&self.cwd, &["branch", "--show-current"])?;
        if output.is_empty() {
            Ok(None)
        } else {
            Ok(Some(output.stdout))
        }
    }

    fn upstream(&self) -> Result<String> {
        let output = run_git(&self.cwd, &["rev-parse", "--abbrev-ref", "@{upstream}"])?;
        if output.is_empty() {
            return Err(GitkitError::Git("no upstream configured".to_string()));
        }
        Ok(output.stdout)
    }

    fn remotes(&self) -> Result<Vec<String>> {
        let output = run_git(&self.cwd, &["remote"])?;
        Ok(output.lines().into_iter().map(String::from).collect())
    }

    fn remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        let pattern = format!("refs/remotes/{}", remote);
        let prefix = format!("{}/", pattern);
        let output = run_git(
            &self.cwd,
            &["for-each-ref", "--format=%(refname)", pattern.as_str()],
        )?;

        Ok(output
            .lines()
            .into_iter()
            .filter_map(|refname| refname.strip_prefix(&prefix))
            .filter(|branch| *branch != "HEAD")
            .map(|branch| format!("{}/{}", remote, branch))
            .collect())
    }

    fn ref_exists(&self, reference: &str) -> bool {
        let spec = format!("{}^{{commit}}", reference);
        run_git(&self.cwd, &["rev-parse", "--verify", "--quiet", spec.as_str()]).is_ok()
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let output = run_git(&self.cwd, &["merge-base", a, b])?;
        if output.is_empty() {
            return Err(GitkitError::Git(format!("no merge base between {} and {}", a, b)));
        }
        Ok(output.stdout)
    }

    fn commit_count(&self, base: &str, head: &str) -> Result<u64> {
        let range = format!("{}..{}", base, head);
        let output = run_git(&self.cwd, &["rev-list", "--count", range.as_str()])?;
        output.stdout.parse::<u64>().map_err(|e| {
            GitkitError::Git(format!(
                "unexpected rev-list output '{}': {}",
                output.stdout, e
            ))
        })
    }

    fn symbolic_ref(&self, name: &str) -> Result<String> {
        let output = run_git(&self.cwd, &["symbolic-ref", "--quiet", name])?;
        if output.is_empty() {
            return Err(GitkitError::Git(format!("{} is not a symbolic ref", name)));
        }
        Ok(output.stdout)
    }

    fn fetch(&self) -> Result<()> {
        run_git(&self.cwd, &["fetch", "--prune", "--quiet"])?;
        Ok(())
    }

    fn path_status(&self, path: &Path) -> Result<PathStatus> {
        let path = path.to_str().ok_or_else(|| {
            GitkitError::Git(format!("path is not valid UTF-8: {}", path.display()))
        })?;
        let output = run_git(
            &self.cwd,
            &[
                "status",
                "--porcelain",
                "--ignored",
                "--untracked-files=all",
                "--",
                path,
            ],
        )?;
        Ok(PathStatus::from_porcelain(&output.stdout))
    }
}
