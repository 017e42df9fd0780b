use crate::backend::{PathStatus, VcsBackend};
use crate::error::{GitkitError, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

pub(crate) fn create_test_repo() -> TempDir {
    create_repo(CreateRepoOptions {
        commits: 1,
        add_origin_remote: false,
    })
}

pub(crate) fn create_test_repo_with_remote() -> TempDir {
    create_repo(CreateRepoOptions {
        commits: 2,
        add_origin_remote: true,
    })
}

struct CreateRepoOptions {
    commits: usize,
    add_origin_remote: bool,
}

fn create_repo(opts: CreateRepoOptions) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    git(path, &["init", "--quiet"]);
    // Ensure the repo uses a deterministic default branch name across environments.
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);

    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "--quiet", "-m", "Initial commit"]);

    for i in 2..=opts.commits {
        std::fs::write(path.join(format!("file{}.txt", i)), format!("File {}\n", i)).unwrap();
        git(path, &["add", "."]);
        git(path, &["commit", "--quiet", "-m", &format!("Commit {}", i)]);
    }

    if opts.add_origin_remote {
        // Remote pointing to itself; `git fetch origin` then populates refs/remotes/origin/*.
        let path_str = path.to_string_lossy().to_string();
        git(path, &["remote", "add", "origin", &path_str]);
    }

    temp_dir
}

/// Write `content` to `relative` (creating parents) and commit it.
pub(crate) fn commit_file(repo_dir: &Path, relative: &str, content: &str) {
    write_file(repo_dir, relative, content);
    git(repo_dir, &["add", relative]);
    git(repo_dir, &["commit", "--quiet", "-m", &format!("Add {}", relative)]);
}

/// Write `content` to `relative`, creating parent directories.
pub(crate) fn write_file(repo_dir: &Path, relative: &str, content: &str) {
    let path = repo_dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub(crate) fn git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
}

/// In-memory [`VcsBackend`] for exercising decision logic without git.
///
/// Anything not explicitly configured behaves like a failed git query.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    pub root: Option<PathBuf>,
    pub current_branch: Option<String>,
    pub upstream: Option<String>,
    pub remotes: Vec<String>,
    pub remote_branches: HashMap<String, Vec<String>>,
    pub existing_refs: HashSet<String>,
    /// Revision -> merge base with `HEAD`.
    pub merge_bases: HashMap<String, String>,
    /// Merge base -> commits on `HEAD` since that base.
    pub distances: HashMap<String, u64>,
    pub symbolic_refs: HashMap<String, String>,
    pub statuses: HashMap<PathBuf, PathStatus>,
    pub fail_fetch: bool,
    pub fetched: std::cell::Cell<bool>,
}

impl FakeBackend {
    /// Register `remote/branch` as a fetched ref at `distance` commits behind `HEAD`.
    pub(crate) fn with_remote_branch(mut self, reference: &str, distance: u64) -> Self {
        let (remote, _) = reference.split_once('/').unwrap();
        if !self.remotes.iter().any(|r| r == remote) {
            self.remotes.push(remote.to_string());
        }
        self.remote_branches
            .entry(remote.to_string())
            .or_default()
            .push(reference.to_string());
        self.existing_refs.insert(reference.to_string());
        let base = format!("base-of-{}", reference);
        self.merge_bases.insert(reference.to_string(), base.clone());
        self.distances.insert(base, distance);
        self
    }

    fn missing(what: &str) -> GitkitError {
        GitkitError::Git(format!("fake backend has no {}", what))
    }
}

impl VcsBackend for FakeBackend {
    fn repo_root(&self) -> Result<PathBuf> {
        self.root.clone().ok_or(GitkitError::NotInRepository)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.current_branch.clone())
    }

    fn upstream(&self) -> Result<String> {
        self.upstream.clone().ok_or_else(|| Self::missing("upstream"))
    }

    fn remotes(&self) -> Result<Vec<String>> {
        Ok(self.remotes.clone())
    }

    fn remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        Ok(self.remote_branches.get(remote).cloned().unwrap_or_default())
    }

    fn ref_exists(&self, reference: &str) -> bool {
        self.existing_refs.contains(reference)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let other = if a == "HEAD" { b } else { a };
        let key = if other == "@{upstream}" {
            self.upstream.clone().unwrap_or_default()
        } else {
            other.to_string()
        };
        self.merge_bases
            .get(&key)
            .cloned()
            .ok_or_else(|| Self::missing("merge base"))
    }

    fn commit_count(&self, base: &str, _head: &str) -> Result<u64> {
        self.distances
            .get(base)
            .copied()
            .ok_or_else(|| Self::missing("commit count"))
    }

    fn symbolic_ref(&self, name: &str) -> Result<String> {
        self.symbolic_refs
            .get(name)
            .cloned()
            .ok_or_else(|| Self::missing("symbolic ref"))
    }

    fn fetch(&self) -> Result<()> {
        self.fetched.set(true);
        if self.fail_fetch {
            Err(Self::missing("network"))
        } else {
            Ok(())
        }
    }

    fn path_status(&self, path: &Path) -> Result<PathStatus> {
        self.statuses
            .get(path)
            .copied()
            .ok_or_else(|| Self::missing("status"))
    }
}
