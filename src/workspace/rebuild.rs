//! Materializing a snapshot on disk

use crate::error::{StorageError, SyncError};
use crate::store::objects::move_file;
use crate::store::ObjectCache;
use crate::tree::entry::Entry;
use crate::tree::entry_map::EntryMap;
use crate::tree::path;
use crate::types::Digest;
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Remove every top-level entry of `root` except the names in `keep`.
pub(super) fn wipe(root: &Path, keep: &[String]) -> Result<usize, StorageError> {
    let mut removed = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        if keep.iter().any(|k| name.to_str() == Some(k.as_str())) {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        trace!(path = %path.display(), "Removed");
        removed += 1;
    }
    debug!(removed, "Wiped workspace");
    Ok(removed)
}

/// Recreate every entry of `target` under `root`: directories first, then
/// symlinks, then regular files.
///
/// The first file of each digest is moved out of the cache; later files with
/// the same digest are copied from it. Modification times of regular files
/// and directory permissions are applied last. Returns the number of regular
/// files written.
pub(super) fn rebuild(root: &Path, target: &EntryMap<'_>, objects: &ObjectCache) -> Result<usize, SyncError> {
    let mut directories: Vec<(PathBuf, &Entry)> = Vec::new();
    let mut symlinks: Vec<(PathBuf, &Entry)> = Vec::new();
    let mut files: Vec<(&str, PathBuf, &Entry)> = Vec::new();

    for (key, entry) in target {
        let full_path = path::key_to_path(root, key);
        if entry.is_dir() {
            directories.push((full_path, *entry));
        } else if entry.mode.is_symlink() {
            symlinks.push((full_path, *entry));
        } else {
            files.push((key.as_str(), full_path, *entry));
        }
    }

    // Parents sort before their children.
    directories.sort_by(|a, b| a.0.cmp(&b.0));
    for (dir, _) in &directories {
        fs::create_dir_all(dir)?;
    }

    for (link, entry) in &symlinks {
        create_symlink(link, entry.target.as_deref().unwrap_or_default())?;
    }

    let mut placed: HashMap<&Digest, &Path> = HashMap::new();
    for (key, file, entry) in &files {
        match &entry.digest {
            None => {
                fs::File::create(file)?;
            }
            Some(digest) => match placed.get(digest) {
                Some(first) => {
                    fs::copy(first, file)?;
                }
                None => {
                    let cached = objects.path_for(digest);
                    if !cached.is_file() {
                        return Err(SyncError::MissingContent {
                            path: key.to_string(),
                            digest: digest.to_string(),
                        });
                    }
                    move_file(&cached, file)?;
                    placed.insert(digest, file.as_path());
                }
            },
        }
        set_permissions(file, entry.mode.permissions())?;
    }

    for (file, entry) in files.iter().map(|(_, f, e)| (f, e)) {
        let mtime = FileTime::from_unix_time(entry.mod_time.timestamp(), entry.mod_time.timestamp_subsec_nanos());
        filetime::set_file_times(file, mtime, mtime)?;
    }
    for (dir, entry) in directories.iter().rev() {
        set_permissions(dir, entry.mode.permissions())?;
    }

    debug!(
        directories = directories.len(),
        symlinks = symlinks.len(),
        files = files.len(),
        "Rebuilt workspace"
    );
    Ok(files.len())
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &str) -> Result<(), StorageError> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_symlink(link: &Path, target: &str) -> Result<(), StorageError> {
    tracing::warn!(path = %link.display(), target, "Symbolic links are not supported here; skipping");
    Ok(())
}

#[cfg(unix)]
fn set_permissions(path: &Path, perm: u32) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(perm))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(path: &Path, perm: u32) -> Result<(), StorageError> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(perm & 0o200 == 0);
    if let Err(e) = fs::set_permissions(path, permissions) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to apply permissions");
    }
    Ok(())
}
