//! Content cache
//!
//! A flat directory of blobs, each file named by the SHA-256 digest of its
//! bytes. The cache holds content that is not currently materialized in the
//! workspace: files preserved across a pull, or spares kept for later pulls.
//! Eviction keeps the total size under a limit, oldest blobs first.

use crate::error::StorageError;
use crate::store::atomic_write;
use crate::types::Digest;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const PARTIAL_SUFFIX: &str = ".partial";

/// Outcome of one eviction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub removed: Vec<Digest>,
    pub freed: u64,
    /// Cache size after eviction
    pub remaining: u64,
}

pub struct ObjectCache {
    dir: PathBuf,
}

impl ObjectCache {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        self.dir.join(digest.as_str())
    }

    /// Download destination for a blob not yet committed to the cache
    pub fn partial_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(format!("{}{}", digest, PARTIAL_SUFFIX))
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Store bytes under their digest. Existing blobs are left untouched.
    pub fn put(&self, digest: &Digest, data: &[u8]) -> Result<(), StorageError> {
        if self.contains(digest) {
            return Ok(());
        }
        atomic_write(&self.path_for(digest), data)
    }

    pub fn get(&self, digest: &Digest) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(digest)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Move `source` into the cache as `digest`.
    ///
    /// Returns false, leaving `source` in place, when the blob is already
    /// cached.
    pub fn adopt(&self, digest: &Digest, source: &Path) -> Result<bool, StorageError> {
        let dest = self.path_for(digest);
        if dest.is_file() {
            return Ok(false);
        }
        move_file(source, &dest)?;
        Ok(true)
    }

    /// Promote a completed download to a cached blob.
    pub fn commit_partial(&self, digest: &Digest) -> Result<(), StorageError> {
        fs::rename(self.partial_path(digest), self.path_for(digest))?;
        Ok(())
    }

    /// Remove a cached blob and any partial download for it.
    pub fn remove(&self, digest: &Digest) -> Result<(), StorageError> {
        for path in [self.path_for(digest), self.partial_path(digest)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Every committed blob with its size and modification time
    fn blobs(&self) -> Result<Vec<(Digest, u64, SystemTime)>, StorageError> {
        let mut blobs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.ends_with(PARTIAL_SUFFIX) || name.ends_with(".tmp") {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            blobs.push((Digest::from_hex(name), metadata.len(), metadata.modified()?));
        }
        Ok(blobs)
    }

    pub fn total_size(&self) -> Result<u64, StorageError> {
        Ok(self.blobs()?.iter().map(|(_, size, _)| size).sum())
    }

    /// Delete blobs, oldest modification time first, until the cache is no
    /// larger than `limit`. Digests in `protected` are never removed.
    pub fn evict(&self, limit: u64, protected: &HashSet<Digest>) -> Result<EvictionReport, StorageError> {
        let mut blobs = self.blobs()?;
        let mut total: u64 = blobs.iter().map(|(_, size, _)| size).sum();
        let mut report = EvictionReport::default();

        if total <= limit {
            report.remaining = total;
            debug!(total, limit, "Cache within limit");
            return Ok(report);
        }

        blobs.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        for (digest, size, _) in blobs {
            if total <= limit {
                break;
            }
            if protected.contains(&digest) {
                continue;
            }
            self.remove(&digest)?;
            total -= size;
            report.freed += size;
            report.removed.push(digest);
        }

        report.remaining = total;
        if total > limit {
            warn!(total, limit, "Cache still above limit; remaining blobs are in use");
        }
        info!(
            removed = report.removed.len(),
            freed = report.freed,
            remaining = total,
            "Cache eviction completed"
        );
        Ok(report)
    }
}

/// Rename, falling back to copy and delete across filesystems.
pub(crate) fn move_file(source: &Path, dest: &Path) -> Result<(), StorageError> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    let mut temp_name = dest.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    fs::copy(source, &temp_path)?;
    fs::rename(&temp_path, dest)?;
    fs::remove_file(source)?;
    Ok(())
}
