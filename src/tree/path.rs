//! Path helpers for workspace-relative keys
//!
//! Snapshot paths are root-relative, `/`-separated strings; the root itself is
//! the empty string.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute canonical directory path.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path).map_err(|e| {
        StorageError::InvalidPath(format!("Failed to canonicalize {}: {}", path.display(), e))
    })
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Relative key of `path` under `root`, `/`-separated.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str().ok_or_else(|| {
                StorageError::InvalidPath(format!("Non UTF-8 name in {}", path.display()))
            })?),
            other => {
                return Err(StorageError::InvalidPath(format!(
                    "Unexpected component {:?} in {}",
                    other,
                    path.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Split a relative key into its segments; the root key yields none.
pub fn split_key(key: &str) -> Vec<&str> {
    key.split('/').filter(|s| !s.is_empty()).collect()
}

pub fn join_key(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Every proper ancestor key of `key`, shallowest first.
pub fn ancestor_keys(key: &str) -> Vec<String> {
    let segments = split_key(key);
    (1..segments.len())
        .map(|depth| segments[..depth].join("/"))
        .collect()
}

/// Absolute filesystem path of a relative key.
pub fn key_to_path(root: &Path, key: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in split_key(key) {
        path.push(segment);
    }
    path
}
