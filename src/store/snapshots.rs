//! Local fileset cache and the current-snapshot pointer
//!
//! Filesets are kept as `<name>.json.gz`, byte-identical to what the remote
//! holds. `_current` names the snapshot the workspace was last synced to; it
//! is replaced atomically, so a crash leaves either the old or the new pointer.

use crate::error::StorageError;
use crate::store::atomic_write;
use crate::tree::fileset::{self, FileSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CURRENT_POINTER: &str = "_current";

pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(fileset::file_name_for(name))
    }

    /// Save a serialized fileset under `name`.
    pub fn store(&self, name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(name);
        atomic_write(&path, data)?;
        debug!(fileset = name, path = %path.display(), "Stored snapshot");
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Option<FileSet>, StorageError> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(Some(FileSet::from_gz_json(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Point `_current` at `name`.
    pub fn set_current(&self, name: &str) -> Result<(), StorageError> {
        let pointer = self.dir.join(CURRENT_POINTER);
        let temp = self.dir.join(format!("{}.tmp", CURRENT_POINTER));
        let _ = fs::remove_file(&temp);
        write_pointer(&temp, &fileset::file_name_for(name))?;
        fs::rename(&temp, &pointer)?;
        debug!(fileset = name, "Updated current snapshot pointer");
        Ok(())
    }

    /// Name of the snapshot the workspace is synced to, if any.
    pub fn current_name(&self) -> Result<Option<String>, StorageError> {
        let pointer = self.dir.join(CURRENT_POINTER);
        match read_pointer(&pointer) {
            Ok(file) => fileset::name_from_file(&file).map(Some).ok_or_else(|| {
                StorageError::InvalidPath(format!("Malformed snapshot pointer: {}", file))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_current(&self) -> Result<Option<FileSet>, StorageError> {
        match self.current_name()? {
            Some(name) => self.load(&name),
            None => Ok(None),
        }
    }
}

#[cfg(unix)]
fn write_pointer(path: &Path, target: &str) -> io::Result<()> {
    std::os::unix::fs::symlink(target, path)
}

#[cfg(unix)]
fn read_pointer(path: &Path) -> io::Result<String> {
    let target = fs::read_link(path)?;
    Ok(target.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn write_pointer(path: &Path, target: &str) -> io::Result<()> {
    fs::write(path, target)
}

#[cfg(not(unix))]
fn read_pointer(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}
