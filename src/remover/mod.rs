//! Backup-first file removal.
//!
//! Every requested path is checked up front; only when all of them pass do
//! any filesystem changes happen. Each file is then classified through the
//! [`VcsBackend`]:
//!
//! - tracked and unmodified: deleted, its content lives in git history
//! - untracked or modified: moved into the backup mirror under a
//!   content-hash-qualified name (see [`naming`])
//!
//! Directories require recursive mode. They are walked depth-first in lexical
//! order, children before parents, and each directory is removed once its
//! children are gone. Nested repositories (a directory holding a `.git` entry)
//! are never entered and stay in place.

pub mod naming;


use crate::backend::{PathStatus, VcsBackend};
use crate::config::Config;
use crate::error::{GitkitError, Result};
use crate::fs::{atomic_write_file, move_file};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Contents of the `.gitignore` written into a fresh backup mirror.
const BACKUP_GITIGNORE: &str = "# Created by safe-rm\n*\n";

/// Options controlling a removal run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Allow directory targets.
    pub recursive: bool,
}

/// One thing that happened (or was skipped) during a removal run.
///
/// Paths are relative to the repository root, except [`Action::Missing`]
/// which keeps the argument as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Tracked, unmodified file deleted outright.
    Deleted(PathBuf),
    /// File moved into the backup mirror.
    BackedUp { original: PathBuf, backup: PathBuf },
    /// An identical backup already existed; the file was deleted.
    AlreadyBackedUp { original: PathBuf, backup: PathBuf },
    /// Directory removed after its contents were handled.
    RemovedDirectory(PathBuf),
    /// Directory left in place because something inside it survived.
    KeptDirectory(PathBuf),
    /// Nested repository inside a recursive target, left untouched.
    NestedRepository(PathBuf),
    /// Argument did not exist.
    Missing(PathBuf),
}

/// Ordered record of a removal run.
#[derive(Debug, Default, Clone)]
pub struct RemovalReport {
    pub actions: Vec<Action>,
}

impl RemovalReport {
    /// `(original, backup)` pairs for every preserved file.
    pub fn backups(&self) -> Vec<(&Path, &Path)> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::BackedUp { original, backup }
                | Action::AlreadyBackedUp { original, backup } => {
                    Some((original.as_path(), backup.as_path()))
                }
                _ => None,
            })
            .collect()
    }

    /// Files deleted without a backup.
    pub fn deleted(&self) -> Vec<&Path> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::Deleted(path) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Arguments that did not exist.
    pub fn missing(&self) -> Vec<&Path> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                Action::Missing(path) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

}

/// Collects actions into a report and hands each one to an observer as it
/// happens, so callers can report progress even when a later step fails.
struct Recorder<'f> {
    report: RemovalReport,
    on_action: &'f mut dyn FnMut(&Action),
}

impl Recorder<'_> {
    fn push(&mut self, action: Action) {
        (self.on_action)(&action);
        self.report.actions.push(action);
    }
}

/// A validated argument.
#[derive(Debug)]
enum Target {
    Missing(PathBuf),
    File { input: PathBuf, absolute: PathBuf },
    Directory { input: PathBuf, absolute: PathBuf },
}

/// Removes paths inside one repository, preserving anything git cannot restore.
pub struct SafeRemover<'a, B: VcsBackend + ?Sized> {
    backend: &'a B,
    cwd: PathBuf,
    repo_root: PathBuf,
    backup_root: PathBuf,
    options: RemoveOptions,
}

impl<'a, B: VcsBackend + ?Sized> SafeRemover<'a, B> {
    /// Create a remover for the repository containing `cwd`.
    ///
    /// Relative arguments are resolved against `cwd`.
    ///
    /// # Errors
    ///
    /// * `GitkitError::NotInRepository` - `cwd` is not inside a git work tree
    pub fn new(
        backend: &'a B,
        config: &Config,
        cwd: impl Into<PathBuf>,
        options: RemoveOptions,
    ) -> Result<Self> {
        let root = backend.repo_root()?;
        let repo_root = root
            .canonicalize()
            .map_err(|e| GitkitError::io("resolve repository root", &root, e))?;
        let backup_root = config.backup_root(&repo_root);

        Ok(Self {
            backend,
            cwd: cwd.into(),
            repo_root,
            backup_root,
            options,
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Remove every path in `paths`.
    ///
    /// All arguments are validated first; if any is outside the repository,
    /// protected, or a directory without recursive mode, nothing is touched.
    pub fn remove<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RemovalReport> {
        self.remove_with(paths, |_| {})
    }

    /// Like [`SafeRemover::remove`], calling `on_action` for every action as
    /// soon as it has happened.
    ///
    /// On error, `on_action` has already seen everything done before the
    /// failure.
    pub fn remove_with<P, F>(&self, paths: &[P], mut on_action: F) -> Result<RemovalReport>
    where
        P: AsRef<Path>,
        F: FnMut(&Action),
    {
        let targets = paths
            .iter()
            .map(|p| self.resolve_target(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut recorder = Recorder {
            report: RemovalReport::default(),
            on_action: &mut on_action,
        };
        for target in targets {
            match target {
                Target::Missing(input) => Self::record_missing(input, &mut recorder),
                // An earlier argument may already have removed this one
                // (repeated or overlapping arguments).
                Target::File { input, absolute } | Target::Directory { input, absolute }
                    if !exists(&absolute)? =>
                {
                    Self::record_missing(input, &mut recorder)
                }
                Target::File { absolute, .. } => self.remove_file(&absolute, &mut recorder)?,
                Target::Directory { absolute, .. } => {
                    self.remove_tree(&absolute, &mut recorder)?
                }
            }
        }
        Ok(recorder.report)
    }

    fn record_missing(input: PathBuf, recorder: &mut Recorder<'_>) {
        debug!("{} does not exist", input.display());
        recorder.push(Action::Missing(input));
    }

    fn resolve_target(&self, input: &Path) -> Result<Target> {
        let metadata = match fs::symlink_metadata(self.cwd.join(input)) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Target::Missing(input.to_path_buf()));
            }
            Err(e) => return Err(GitkitError::io("inspect", input, e)),
        };

        let absolute = self.absolute_path(input)?;
        let relative = absolute
            .strip_prefix(&self.repo_root)
            .map_err(|_| GitkitError::OutsideRepository(input.to_path_buf()))?;

        if relative.as_os_str().is_empty() {
            return Err(GitkitError::protected(input, "it is the repository root"));
        }
        if relative
            .components()
            .any(|c| c == Component::Normal(".git".as_ref()))
        {
            return Err(GitkitError::protected(input, "it is inside the .git directory"));
        }
        if absolute.starts_with(&self.backup_root) {
            return Err(GitkitError::protected(input, "it is inside the backup directory"));
        }

        if metadata.is_dir() {
            if !self.options.recursive {
                return Err(GitkitError::DirectoryWithoutRecursive(input.to_path_buf()));
            }
            if self.backup_root.starts_with(&absolute) {
                return Err(GitkitError::protected(input, "it contains the backup directory"));
            }
            Ok(Target::Directory {
                input: input.to_path_buf(),
                absolute,
            })
        } else {
            Ok(Target::File {
                input: input.to_path_buf(),
                absolute,
            })
        }
    }

    /// Absolute path with symlinks resolved in the parent but not in the final
    /// component, so a symlink argument refers to the link itself.
    fn absolute_path(&self, input: &Path) -> Result<PathBuf> {
        let joined = self.cwd.join(input);
        match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(name)) => {
                let parent = parent
                    .canonicalize()
                    .map_err(|e| GitkitError::io("resolve", parent, e))?;
                Ok(parent.join(name))
            }
            _ => joined
                .canonicalize()
                .map_err(|e| GitkitError::io("resolve", &joined, e)),
        }
    }

    fn relative<'p>(&self, absolute: &'p Path) -> &'p Path {
        absolute.strip_prefix(&self.repo_root).unwrap_or(absolute)
    }

    fn classify(&self, absolute: &Path) -> PathStatus {
        match self.backend.path_status(absolute) {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "could not query git status of {}, preserving it: {}",
                    self.relative(absolute).display(),
                    e
                );
                PathStatus::Modified
            }
        }
    }

    fn remove_file(&self, absolute: &Path, report: &mut Recorder<'_>) -> Result<()> {
        let relative = self.relative(absolute).to_path_buf();
        let status = self.classify(absolute);
        debug!("{}: {:?}", relative.display(), status);

        if status == PathStatus::Unmodified {
            fs::remove_file(absolute).map_err(|e| GitkitError::io("remove", absolute, e))?;
            report.push(Action::Deleted(relative));
            return Ok(());
        }

        let hash = naming::hash_path(absolute)?;
        let backup = naming::backup_path(&self.backup_root, &relative, &hash)?;
        let backup_relative = self.relative(&backup).to_path_buf();
        self.ensure_backup_root()?;

        if fs::symlink_metadata(&backup).is_ok() {
            let existing = naming::hash_path(&backup)?;
            if existing != hash {
                return Err(GitkitError::Io(format!(
                    "backup '{}' already exists with different content; '{}' left in place",
                    backup_relative.display(),
                    relative.display()
                )));
            }
            debug!("identical backup already at {}", backup_relative.display());
            fs::remove_file(absolute).map_err(|e| GitkitError::io("remove", absolute, e))?;
            report.push(Action::AlreadyBackedUp {
                original: relative,
                backup: backup_relative,
            });
            return Ok(());
        }

        move_file(absolute, &backup)?;
        report.push(Action::BackedUp {
            original: relative,
            backup: backup_relative,
        });
        Ok(())
    }

    /// Walk `root` in lexical pre-order, handling files as they come and
    /// removing each directory once the walk has left it.
    fn remove_tree(&self, root: &Path, report: &mut Recorder<'_>) -> Result<()> {
        // open[d] is the directory entered at depth d.
        let mut open: Vec<PathBuf> = Vec::new();
        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                GitkitError::Io(format!("failed to walk '{}': {}", path.display(), e))
            })?;

            while open.len() > entry.depth() {
                if let Some(dir) = open.pop() {
                    self.remove_dir(&dir, report);
                }
            }

            if !entry.file_type().is_dir() {
                self.remove_file(entry.path(), report)?;
                continue;
            }

            if is_repository(entry.path()) {
                let relative = self.relative(entry.path()).to_path_buf();
                warn!("{} is a nested git repository, leaving it in place", relative.display());
                report.push(Action::NestedRepository(relative));
                walker.skip_current_dir();
                continue;
            }
            open.push(entry.into_path());
        }

        while let Some(dir) = open.pop() {
            self.remove_dir(&dir, report);
        }
        Ok(())
    }

    fn remove_dir(&self, dir: &Path, report: &mut Recorder<'_>) {
        let relative = self.relative(dir).to_path_buf();
        match fs::remove_dir(dir) {
            Ok(()) => report.push(Action::RemovedDirectory(relative)),
            Err(e) => {
                warn!("directory {} not removed: {}", relative.display(), e);
                report.push(Action::KeptDirectory(relative));
            }
        }
    }

    fn ensure_backup_root(&self) -> Result<()> {
        if self.backup_root.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backup_root)
            .map_err(|e| GitkitError::io("create backup directory", &self.backup_root, e))?;
        atomic_write_file(self.backup_root.join(".gitignore"), BACKUP_GITIGNORE)
    }
}

fn exists(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(GitkitError::io("inspect", path, e)),
    }
}

/// A directory holding a `.git` entry (directory or gitfile).
fn is_repository(dir: &Path) -> bool {
    fs::symlink_metadata(dir.join(".git")).is_ok()
}
