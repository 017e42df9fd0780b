//! Backup naming.
//!
//! A preserved file `dir/name.ext` lands at `<backup root>/dir/name.<hash8>.ext`,
//! where `hash8` is the first eight hex digits of the MD5 of its content. Files
//! without a `.` get the hash appended instead. The name depends only on the
//! relative path and the content, so identical content maps to the same backup
//! and different content never overwrites an earlier one.

use crate::error::{GitkitError, Result};
use md5::{Digest, Md5};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Number of hex digits of the digest kept in backup names.
pub const HASH_LEN: usize = 8;

/// Truncated MD5 hex digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    truncate(format!("{:x}", Md5::digest(bytes)))
}

/// Truncated MD5 hex digest of what would be backed up for `path`.
///
/// Regular files are hashed by content (streamed); symlinks by their target path.
pub fn hash_path(path: &Path) -> Result<String> {
    let metadata = fs::symlink_metadata(path).map_err(|e| GitkitError::io("inspect", path, e))?;

    if metadata.file_type().is_symlink() {
        let target = fs::read_link(path).map_err(|e| GitkitError::io("read link", path, e))?;
        return Ok(content_hash(target.as_os_str().as_encoded_bytes()));
    }

    let mut file = File::open(path).map_err(|e| GitkitError::io("open", path, e))?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher).map_err(|e| GitkitError::io("read", path, e))?;
    Ok(truncate(format!("{:x}", hasher.finalize())))
}

/// Insert `hash` before the last extension of `file_name`, or append it.
///
/// `notes.txt` -> `notes.<hash>.txt`, `archive.tar.gz` -> `archive.tar.<hash>.gz`,
/// `Makefile` -> `Makefile.<hash>`.
pub fn backup_file_name(file_name: &str, hash: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}.{}.{}", stem, hash, ext),
        None => format!("{}.{}", file_name, hash),
    }
}

/// Backup location for a repo-relative file path.
pub fn backup_path(backup_root: &Path, relative: &Path, hash: &str) -> Result<PathBuf> {
    let file_name = relative.file_name().ok_or_else(|| {
        GitkitError::Io(format!("cannot back up '{}': no file name", relative.display()))
    })?;

    let name = match file_name.to_str() {
        Some(name) => OsString::from(backup_file_name(name, hash)),
        None => {
            // Not UTF-8: keep the original bytes and append the hash.
            let mut name = file_name.to_os_string();
            name.push(".");
            name.push(hash);
            name
        }
    };

    let parent = relative.parent().unwrap_or(Path::new(""));
    Ok(backup_root.join(parent).join(name))
}

fn truncate(mut hex: String) -> String {
    hex.truncate(HASH_LEN);
    hex
}
