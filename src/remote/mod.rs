//! Remote object store access
//!
//! A remote workspace lives under `<key_prefix>/<workspace>/` in an object
//! store: content blobs at `files/<digest>` and published snapshots at
//! `filesets/<name>.json.gz`. The store itself is abstracted behind
//! [`ObjectStore`] so the sync engine does not depend on a particular backend.

pub mod local;

pub use local::LocalObjectStore;

use crate::error::{SyncError, TransferError};
use crate::tree::fileset::{self, FileSet};
use crate::types::Digest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Listing record for one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Minimal key/value object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, TransferError>;

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), TransferError>;

    /// Fails with [`TransferError::NotFound`] for a missing key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, TransferError>;

    /// Every object whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, TransferError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), TransferError>;

    /// Upload a local file, returning the number of bytes sent.
    async fn put_file(&self, key: &str, source: &Path) -> Result<u64, TransferError> {
        let data = tokio::fs::read(source).await?;
        let len = data.len() as u64;
        self.put(key, data).await?;
        Ok(len)
    }

    /// Download an object into a local file, returning the number of bytes
    /// received.
    async fn get_file(&self, key: &str, dest: &Path) -> Result<u64, TransferError> {
        let data = self.get(key).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }
}

/// A published fileset as seen in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesetInfo {
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

/// One workspace's namespace within an object store
#[derive(Clone)]
pub struct Remote {
    workspace: String,
    key_prefix: String,
    store: Arc<dyn ObjectStore>,
}

impl Remote {
    pub fn new(workspace: impl Into<String>, key_prefix: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            workspace: workspace.into(),
            key_prefix: key_prefix.into().trim_matches('/').to_string(),
            store,
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn workspace_prefix(&self) -> String {
        format!("{}{}/", prefix_root(&self.key_prefix), self.workspace)
    }

    pub fn files_prefix(&self) -> String {
        format!("{}files/", self.workspace_prefix())
    }

    pub fn filesets_prefix(&self) -> String {
        format!("{}filesets/", self.workspace_prefix())
    }

    pub fn blob_key(&self, digest: &Digest) -> String {
        format!("{}{}", self.files_prefix(), digest)
    }

    pub fn fileset_key(&self, name: &str) -> String {
        format!("{}{}", self.filesets_prefix(), fileset::file_name_for(name))
    }

    /// Whether anything at all is stored for this workspace
    pub async fn exists(&self) -> Result<bool, TransferError> {
        Ok(!self.store.list(&self.workspace_prefix()).await?.is_empty())
    }

    pub async fn blob_exists(&self, digest: &Digest) -> Result<bool, TransferError> {
        self.store.exists(&self.blob_key(digest)).await
    }

    pub async fn delete_blob(&self, digest: &Digest) -> Result<(), TransferError> {
        self.store.delete(&self.blob_key(digest)).await
    }

    /// Published filesets, sorted by name
    pub async fn filesets(&self) -> Result<Vec<FilesetInfo>, TransferError> {
        let mut filesets: Vec<FilesetInfo> = self
            .store
            .list(&self.filesets_prefix())
            .await?
            .into_iter()
            .filter_map(|meta| {
                fileset::name_from_file(&meta.key).map(|name| FilesetInfo {
                    name,
                    last_modified: meta.last_modified,
                })
            })
            .collect();
        filesets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(filesets)
    }

    /// The most recently modified fileset, if any
    pub async fn latest_fileset(&self) -> Result<Option<String>, TransferError> {
        Ok(self
            .filesets()
            .await?
            .into_iter()
            .max_by(|a, b| {
                a.last_modified
                    .cmp(&b.last_modified)
                    .then_with(|| a.name.cmp(&b.name))
            })
            .map(|info| info.name))
    }

    /// Download and decode a fileset, returning it with its raw bytes.
    pub async fn fetch_fileset(&self, name: &str) -> Result<(FileSet, Vec<u8>), SyncError> {
        let key = self.fileset_key(name);
        let data = match self.store.get(&key).await {
            Ok(data) => data,
            Err(TransferError::NotFound(_)) => return Err(SyncError::FilesetNotFound(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let file_set = FileSet::from_gz_json(&data)?;
        debug!(fileset = name, entries = file_set.count, "Fetched fileset");
        Ok((file_set, data))
    }

    pub async fn publish_fileset(&self, name: &str, data: Vec<u8>) -> Result<(), TransferError> {
        self.store.put(&self.fileset_key(name), data).await?;
        info!(workspace = %self.workspace, fileset = name, "Published fileset");
        Ok(())
    }

    pub async fn delete_fileset(&self, name: &str) -> Result<(), TransferError> {
        self.store.delete(&self.fileset_key(name)).await
    }
}

fn prefix_root(key_prefix: &str) -> String {
    if key_prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", key_prefix)
    }
}

/// Names of every workspace under `key_prefix`, sorted
pub async fn list_workspaces(store: &dyn ObjectStore, key_prefix: &str) -> Result<Vec<String>, TransferError> {
    let root = prefix_root(key_prefix.trim_matches('/'));
    let names: BTreeSet<String> = store
        .list(&root)
        .await?
        .into_iter()
        .filter_map(|meta| {
            meta.key
                .strip_prefix(&root)
                .and_then(|rest| rest.split_once('/'))
                .map(|(workspace, _)| workspace.to_string())
        })
        .collect();
    Ok(names.into_iter().collect())
}
