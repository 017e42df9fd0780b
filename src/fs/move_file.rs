//! File move helpers.
//!
//! Backups are moved with `rename(2)`. The backup mirror normally lives on the
//! same filesystem as the work tree, but bind mounts and container volumes can
//! surface `EXDEV` ("Invalid cross-device link") even for paths that look
//! local. For those cases we fall back to copy + delete.

use crate::error::{GitkitError, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Move a single file (or symlink) from `source` to `destination`.
///
/// - Creates the destination's parent directories.
/// - Tries `rename()` first (atomic when possible).
/// - Falls back to an atomic write to `destination` + delete of `source` on EXDEV.
pub fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| GitkitError::io("create backup directory", parent, e))?;
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_rename(&e) => move_file_cross_device(source, destination, e),
        Err(e) => Err(GitkitError::Io(format!(
            "failed to move '{}' to '{}': {}",
            source.display(),
            destination.display(),
            e
        ))),
    }
}

fn move_file_cross_device(
    source: &Path,
    destination: &Path,
    original_error: io::Error,
) -> Result<()> {
    let metadata =
        fs::symlink_metadata(source).map_err(|e| GitkitError::io("inspect", source, e))?;

    if metadata.file_type().is_symlink() {
        let target = fs::read_link(source).map_err(|e| GitkitError::io("read link", source, e))?;
        create_symlink(&target, destination)
            .map_err(|e| GitkitError::io("recreate link", destination, e))?;
    } else {
        let content = fs::read(source).map_err(|e| {
            GitkitError::Io(format!(
                "failed to read '{}' for cross-device move: {} (original rename error: {})",
                source.display(),
                e,
                original_error
            ))
        })?;
        crate::fs::atomic_write(destination, &content)?;
        // Keep the executable bit and friends.
        let _ = fs::set_permissions(destination, metadata.permissions());
    }

    fs::remove_file(source).map_err(|e| {
        GitkitError::Io(format!(
            "copied '{}' across devices but failed to delete the original: {}",
            source.display(),
            e
        ))
    })
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "moving symlinks across devices is only supported on unix",
    ))
}

fn is_cross_device_rename(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || err.raw_os_error() == Some(18)
}
