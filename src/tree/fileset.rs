//! Published snapshots
//!
//! A [`FileSet`] is the unit pushed to and pulled from the remote: a snapshot
//! tree plus totals, a creation time and an optional comment. On the wire it is
//! gzip-compressed JSON stored as `<name>.json.gz`.

use crate::error::StorageError;
use crate::tree::entry::Entry;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// File name suffix of a serialized fileset
pub const FILESET_SUFFIX: &str = ".json.gz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSet {
    /// Sum of the sizes of every regular file
    pub size: u64,
    /// Number of entries, root included
    pub count: u64,
    pub root: Entry,
    pub crtime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl FileSet {
    /// Wrap a tree, computing its totals and stamping the creation time.
    pub fn from_root(root: Entry) -> Self {
        Self {
            size: root.total_size(),
            count: root.count(),
            root,
            crtime: Utc::now(),
            comment: String::new(),
        }
    }

    /// Replace the tree and recompute totals.
    pub fn replace_root(&mut self, root: Entry) {
        self.size = root.total_size();
        self.count = root.count();
        self.root = root;
    }

    /// Equality ignoring the creation time.
    pub fn same_content(&self, other: &FileSet) -> bool {
        self.size == other.size
            && self.count == other.count
            && self.comment == other.comment
            && self.root == other.root
    }

    pub fn to_json(&self) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    pub fn to_gz_json(&self) -> Result<Vec<u8>, StorageError> {
        let json = self.to_json()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    pub fn from_gz_json(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut json = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut json)?;
        Self::from_json(&json)
    }
}

/// `<name>.json.gz`
pub fn file_name_for(name: &str) -> String {
    format!("{}{}", name, FILESET_SUFFIX)
}

/// Fileset name from a path or key ending in `<name>.json.gz`.
///
/// Returns `None` when the final component does not carry the suffix.
pub fn name_from_file(file: &str) -> Option<String> {
    let base = Path::new(file).file_name()?.to_str()?;
    base.strip_suffix(FILESET_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
