//! Remembered pull patterns
//!
//! Patterns from filtered pulls are kept newest first without duplicates, so
//! later pulls and pushes can offer them again.

use crate::error::StorageError;
use crate::store::atomic_write;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PatternFile {
    patterns: Vec<String>,
}

pub struct PatternCache {
    path: PathBuf,
    patterns: Vec<String>,
}

impl PatternCache {
    /// Load the cache at `path`. A missing or unreadable file yields an empty
    /// cache.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let patterns = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<PatternFile>(&bytes) {
                Ok(file) => file.patterns,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable pattern cache");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, patterns })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Put `new` in front of the remembered patterns, dropping duplicates.
    pub fn record(&mut self, new: &[String]) -> Result<(), StorageError> {
        let mut merged: Vec<String> = Vec::with_capacity(new.len() + self.patterns.len());
        for pattern in new.iter().chain(self.patterns.iter()) {
            if !merged.contains(pattern) {
                merged.push(pattern.clone());
            }
        }
        self.patterns = merged;
        self.save()
    }

    fn save(&self) -> Result<(), StorageError> {
        let file = PatternFile {
            patterns: self.patterns.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        atomic_write(&self.path, &bytes)
    }
}
