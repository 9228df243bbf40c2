//! Filesystem walker for traversing a workspace
//!
//! Produces entries in pre-order (a directory before its contents), siblings
//! sorted by name. Symlinks are never followed.

use crate::error::StorageError;
use crate::tree::path;
use std::fs::Metadata;
use std::path::PathBuf;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Kind of a walked node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    Symlink,
    /// Sockets, devices, pipes
    Other,
}

/// A node found under the walk root
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Root-relative key, `/`-separated
    pub key: String,
    pub kind: NodeKind,
    pub metadata: Metadata,
}

/// Filesystem walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Names skipped at every level, along with everything beneath them
    pub ignore_names: Vec<String>,
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the tree and collect every node except the root itself.
    pub fn walk(&self) -> Result<Vec<WalkEntry>, StorageError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_ignore(entry));

        for entry in walker {
            let entry = entry.map_err(|e| StorageError::Walk(e.to_string()))?;
            if entry.depth() == 0 {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                StorageError::Walk(format!(
                    "Failed to read metadata for {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;

            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                NodeKind::Symlink
            } else if file_type.is_dir() {
                NodeKind::Directory
            } else if file_type.is_file() {
                NodeKind::File
            } else {
                NodeKind::Other
            };

            entries.push(WalkEntry {
                key: path::relative_key(&self.root, entry.path())?,
                path: entry.into_path(),
                kind,
                metadata,
            });
        }

        Ok(entries)
    }

    fn should_ignore(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        let ignored = self.config.ignore_names.iter().any(|n| *n == name);
        if ignored {
            debug!(path = %entry.path().display(), "Ignoring path");
        }
        ignored
    }
}
