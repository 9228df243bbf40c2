//! Configuration System
//!
//! Layered configuration loaded with the `config` crate: built-in defaults,
//! the global user file, the workspace file, then `SETSYNC__SECTION__KEY`
//! environment variables. The loaded [`SyncConfig`] is passed explicitly to
//! the workspace; nothing is held in process-wide state.

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Default object cache bound: 5 GiB
pub const DEFAULT_CACHE_LIMIT: u64 = 5 * 1024 * 1024 * 1024;
pub const DEFAULT_TRANSFER_CONCURRENCY: usize = 32;
pub const DEFAULT_KEY_PREFIX: &str = ".setsync";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where remote workspaces live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Directory backing the object store
    #[serde(default = "default_remote_root")]
    pub root: PathBuf,

    /// Top-level key prefix under which every workspace is stored
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Sync engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Object cache size bound in bytes
    #[serde(default = "default_cache_limit")]
    pub cache_limit: u64,

    /// Maximum concurrent transfers
    #[serde(default = "default_transfer_concurrency")]
    pub transfer_concurrency: usize,

    /// Accept symlinks resolving outside the workspace
    #[serde(default)]
    pub allow_external_links: bool,

    /// Extra names ignored at every level
    #[serde(default)]
    pub ignore: Vec<String>,
}

pub(crate) fn default_remote_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.data_dir().join("setsync").join("remote"))
        .unwrap_or_else(|| PathBuf::from(".setsync-remote"))
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_cache_limit() -> u64 {
    DEFAULT_CACHE_LIMIT
}

fn default_transfer_concurrency() -> usize {
    DEFAULT_TRANSFER_CONCURRENCY
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            root: default_remote_root(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            cache_limit: default_cache_limit(),
            transfer_concurrency: default_transfer_concurrency(),
            allow_external_links: false,
            ignore: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut errors = Vec::new();
        if self.remote.key_prefix.trim_matches('/').is_empty() {
            errors.push("remote.key_prefix cannot be empty".to_string());
        }
        if self.remote.root.as_os_str().is_empty() {
            errors.push("remote.root cannot be empty".to_string());
        }
        if self.sync.transfer_concurrency == 0 {
            errors.push("sync.transfer_concurrency must be at least 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}
