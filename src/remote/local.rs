//! Directory-backed object store
//!
//! Keys map to files beneath a root directory. Writes go through a temp file
//! and a rename so a listing never observes a half-written object.

use crate::error::TransferError;
use crate::remote::{ObjectMeta, ObjectStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const TEMP_SUFFIX: &str = ".upload";

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key`; keys must be relative and free of `..`.
    fn object_path(&self, key: &str) -> Result<PathBuf, TransferError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(TransferError::Store {
                key: key.to_string(),
                message: "invalid object key".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    async fn write_atomically(&self, key: &str, path: &Path, data: &[u8]) -> Result<(), TransferError> {
        let temp = temp_path(path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&temp, data).await?;
        tokio::fs::rename(&temp, path).await.map_err(|e| TransferError::Store {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

fn not_found(key: &str, err: io::Error) -> TransferError {
    if err.kind() == io::ErrorKind::NotFound {
        TransferError::NotFound(key.to_string())
    } else {
        TransferError::IoError(err)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, TransferError> {
        let path = self.object_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), TransferError> {
        let path = self.object_path(key)?;
        self.write_atomically(key, &path, &data).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, TransferError> {
        let path = self.object_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| not_found(key, e))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, TransferError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_blocking(&root, &prefix))
            .await
            .map_err(|e| TransferError::Task(e.to_string()))?
    }

    async fn delete(&self, key: &str) -> Result<(), TransferError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_file(&self, key: &str, source: &Path) -> Result<u64, TransferError> {
        let path = self.object_path(key)?;
        let temp = temp_path(&path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(source, &temp).await?;
        tokio::fs::rename(&temp, &path).await?;
        Ok(bytes)
    }

    async fn get_file(&self, key: &str, dest: &Path) -> Result<u64, TransferError> {
        let path = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&path, dest).await.map_err(|e| not_found(key, e))
    }
}

fn list_blocking(root: &Path, prefix: &str) -> Result<Vec<ObjectMeta>, TransferError> {
    // Walk only the deepest directory fully named by the prefix.
    let dir_part = prefix.rfind('/').map(|i| &prefix[..i]).unwrap_or("");
    let base = if dir_part.is_empty() {
        root.to_path_buf()
    } else {
        root.join(dir_part)
    };
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut objects = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|e| TransferError::Store {
            key: prefix.to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.ends_with(TEMP_SUFFIX) || !key.starts_with(prefix) {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| TransferError::Store {
            key: key.clone(),
            message: e.to_string(),
        })?;
        objects.push(ObjectMeta {
            key,
            size: metadata.len(),
            last_modified: DateTime::<Utc>::from(metadata.modified()?),
        });
    }
    Ok(objects)
}
