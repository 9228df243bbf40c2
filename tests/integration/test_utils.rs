//! Shared test utilities for integration tests
//!
//! Every harness owns a temporary directory holding a local object store
//! root and any number of workspace directories.

use filetime::FileTime;
use setsync::config::SyncConfig;
use setsync::remote::local::LocalObjectStore;
use setsync::remote::{ObjectStore, Remote};
use setsync::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub temp: TempDir,
    pub config: SyncConfig,
    pub store: Arc<dyn ObjectStore>,
}

impl Harness {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let remote_root = temp.path().join("remote");
        fs::create_dir_all(&remote_root).unwrap();

        let mut config = SyncConfig::default();
        config.remote.root = remote_root.clone();
        config.sync.transfer_concurrency = 4;

        Harness {
            store: Arc::new(LocalObjectStore::new(&remote_root)),
            config,
            temp,
        }
    }

    pub fn with_cache_limit(limit: u64) -> Self {
        let mut harness = Self::new();
        harness.config.sync.cache_limit = limit;
        harness
    }

    /// Fresh directory `name` inside the harness
    pub fn dir(&self, name: &str) -> PathBuf {
        let dir = self.temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub async fn init(&self, dir: &str, name: &str) -> Workspace {
        Workspace::init(&self.dir(dir), name, &self.config, Arc::clone(&self.store), false)
            .await
            .unwrap()
    }

    pub fn remote(&self, workspace: &str) -> Remote {
        Remote::new(workspace, self.config.remote.key_prefix.as_str(), Arc::clone(&self.store))
    }

    /// Number of content blobs stored for `workspace`
    pub async fn blob_count(&self, workspace: &str) -> usize {
        let remote = self.remote(workspace);
        self.store.list(&remote.files_prefix()).await.unwrap().len()
    }
}

/// Write `content` at `rel` below `root` with a fixed modification time.
pub fn write_file(root: &Path, rel: &str, content: &str, mtime_secs: i64) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}

pub fn read_file(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

pub fn mtime_secs(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

/// Relative paths of everything under `root` except workspace metadata
pub fn tree_listing(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".setsync")
        .map(|e| {
            e.unwrap()
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    paths.sort();
    paths
}
