//! Local workspace state under the metadata directory
//!
//! - [`ObjectCache`]: content blobs named by digest
//! - [`SnapshotCache`]: pulled/pushed filesets and the `_current` pointer
//! - [`PatternCache`]: patterns used by previous filtered pulls

pub mod objects;
pub mod patterns;
pub mod snapshots;

pub use objects::{EvictionReport, ObjectCache};
pub use patterns::PatternCache;
pub use snapshots::SnapshotCache;

use crate::error::StorageError;
use std::fs;
use std::path::Path;

/// Write `data` to `path` through a sibling temp file and a rename, so readers
/// see either the old contents or the new ones.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(format!("{} has no file name", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, data)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to rename temp file to {:?}: {}", path, e),
        ))
    })?;
    Ok(())
}
