//! Workspace handle: creation, discovery and snapshot bookkeeping

use crate::config::{SyncConfig, SyncSettings};
use crate::diff;
use crate::error::{StorageError, SyncError};
use crate::filter::FileSetFilter;
use crate::remote::{self, FilesetInfo, ObjectStore, Remote};
use crate::store::{ObjectCache, PatternCache, SnapshotCache};
use crate::transfer::TransferPool;
use crate::tree::builder::{BuilderConfig, TreeBuilder};
use crate::tree::entry_map::EntryMap;
use crate::tree::path;
use crate::types::Digest;
use crate::workspace::types::{always_confirm, DeleteReport, PullOutcome, StatusReport};
use crate::workspace::{IDENTITY_FILE, METADATA_DIR, OBJECT_DIR, PATTERN_FILE, SNAPSHOT_DIR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
struct IdentityFile {
    name: String,
}

pub struct Workspace {
    pub(super) name: String,
    pub(super) root: PathBuf,
    pub(super) settings: SyncSettings,
    pub(super) remote: Remote,
    pub(super) transfer: TransferPool,
    pub(super) snapshots: SnapshotCache,
    pub(super) objects: ObjectCache,
    pub(super) patterns: PatternCache,
}

impl Workspace {
    /// Turn `dir` into a workspace named `name`.
    ///
    /// Unless `cloning`, the remote must not already hold a workspace of that
    /// name.
    #[instrument(skip(dir, config, store), fields(dir = %dir.display()))]
    pub async fn init(
        dir: &Path,
        name: &str,
        config: &SyncConfig,
        store: Arc<dyn ObjectStore>,
        cloning: bool,
    ) -> Result<Workspace, SyncError> {
        validate_workspace_name(name)?;
        if !dir.is_dir() {
            return Err(StorageError::NotADirectory(dir.to_path_buf()).into());
        }
        let root = path::canonicalize_root(dir)?;
        let metadata_dir = root.join(METADATA_DIR);
        if metadata_dir.exists() {
            return Err(SyncError::AlreadyInitialized(root));
        }

        let remote = Remote::new(name, config.remote.key_prefix.clone(), Arc::clone(&store));
        if !cloning && remote.exists().await? {
            return Err(SyncError::WorkspaceExists(name.to_string()));
        }

        fs::create_dir_all(metadata_dir.join(SNAPSHOT_DIR))?;
        fs::create_dir_all(metadata_dir.join(OBJECT_DIR))?;
        let identity = toml::to_string(&IdentityFile {
            name: name.to_string(),
        })
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(metadata_dir.join(IDENTITY_FILE), identity)?;

        info!(workspace = name, root = %root.display(), "Initialized workspace");
        Self::assemble(name.to_string(), root, config, store)
    }

    /// Open the workspace containing `dir` (searching upward).
    pub fn open(dir: &Path, config: &SyncConfig, store: Arc<dyn ObjectStore>) -> Result<Workspace, SyncError> {
        let root = Self::discover_root(dir)?;
        let raw = fs::read_to_string(root.join(METADATA_DIR).join(IDENTITY_FILE))?;
        let identity: IdentityFile =
            toml::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
        debug!(workspace = %identity.name, root = %root.display(), "Opened workspace");
        Self::assemble(identity.name, root, config, store)
    }

    /// Nearest ancestor of `dir` (inclusive) holding a workspace identity.
    pub fn discover_root(dir: &Path) -> Result<PathBuf, SyncError> {
        let start = path::canonicalize_root(dir)?;
        let found = start
            .ancestors()
            .find(|candidate| candidate.join(METADATA_DIR).join(IDENTITY_FILE).is_file())
            .map(Path::to_path_buf);
        found.ok_or(SyncError::NotAWorkspace(start))
    }

    /// Create `<parent>/<workspace>`, bind it to the existing remote workspace
    /// and pull `fileset`, or the most recent fileset when none is named.
    #[instrument(skip(parent, filter, config, store), fields(parent = %parent.display()))]
    pub async fn clone_remote(
        parent: &Path,
        workspace: &str,
        fileset: Option<&str>,
        filter: &FileSetFilter,
        config: &SyncConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Result<(Workspace, PullOutcome), SyncError> {
        validate_workspace_name(workspace)?;
        let remote = Remote::new(workspace, config.remote.key_prefix.clone(), Arc::clone(&store));
        let fileset = match fileset {
            Some(name) => name.to_string(),
            None => remote
                .latest_fileset()
                .await?
                .ok_or_else(|| SyncError::NoFilesets(workspace.to_string()))?,
        };

        let dir = parent.join(workspace);
        fs::create_dir_all(&dir)?;
        let mut ws = Self::init(&dir, workspace, config, store, true).await?;
        let outcome = ws.pull(&fileset, filter, &mut always_confirm).await?;
        Ok((ws, outcome))
    }

    fn assemble(
        name: String,
        root: PathBuf,
        config: &SyncConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Workspace, SyncError> {
        let metadata_dir = root.join(METADATA_DIR);
        Ok(Workspace {
            remote: Remote::new(name.clone(), config.remote.key_prefix.clone(), Arc::clone(&store)),
            transfer: TransferPool::new(store, config.sync.transfer_concurrency),
            snapshots: SnapshotCache::open(metadata_dir.join(SNAPSHOT_DIR))?,
            objects: ObjectCache::open(metadata_dir.join(OBJECT_DIR))?,
            patterns: PatternCache::load(metadata_dir.join(PATTERN_FILE))?,
            settings: config.sync.clone(),
            name,
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote(&self) -> &Remote {
        &self.remote
    }

    pub fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    /// Patterns of earlier filtered pulls, newest first
    pub fn recorded_patterns(&self) -> &[String] {
        self.patterns.patterns()
    }

    pub fn current_fileset(&self) -> Result<Option<String>, SyncError> {
        Ok(self.snapshots.current_name()?)
    }

    /// Names skipped by every scan: the metadata directory plus configured ones
    pub(super) fn ignore_names(&self) -> Vec<String> {
        let mut names = vec![METADATA_DIR.to_string()];
        names.extend(self.settings.ignore.iter().cloned());
        names
    }

    pub(super) fn builder_config(&self, gen_digest: bool) -> BuilderConfig {
        BuilderConfig {
            root: self.root.clone(),
            gen_digest,
            allow_external_links: self.settings.allow_external_links,
            ignore_names: self.ignore_names(),
        }
    }

    /// Current snapshot name and local changes against it.
    #[instrument(skip(self), fields(workspace = %self.name))]
    pub fn status(&self) -> Result<StatusReport, SyncError> {
        let current = self.snapshots.current_name()?;
        let cached = self.snapshots.load_current()?;
        let local = TreeBuilder::new(self.builder_config(false)).build()?;

        let empty = EntryMap::new();
        let cached_map = cached.as_ref().map(|fs| fs.root.flatten());
        let local_map = local.file_set.root.flatten();
        let changes = diff::diff(cached_map.as_ref().unwrap_or(&empty), &local_map);

        Ok(StatusReport {
            workspace: self.name.clone(),
            root: self.root.clone(),
            current,
            added: changes.added.keys().cloned().collect(),
            removed: changes.removed.keys().cloned().collect(),
            updated: changes.updated.keys().cloned().collect(),
        })
    }

    /// Remote filesets of this workspace, sorted by name
    pub async fn filesets(&self) -> Result<Vec<FilesetInfo>, SyncError> {
        Ok(self.remote.filesets().await?)
    }

    pub async fn latest_fileset(&self) -> Result<Option<String>, SyncError> {
        Ok(self.remote.latest_fileset().await?)
    }

    /// Delete a remote fileset and every blob no other fileset references.
    ///
    /// Not safe against a concurrent push referencing the same blobs.
    #[instrument(skip(self), fields(workspace = %self.name))]
    pub async fn delete_fileset(&self, name: &str) -> Result<DeleteReport, SyncError> {
        let (target, _) = self.remote.fetch_fileset(name).await?;
        let mut candidates: BTreeSet<Digest> = target.root.digest_map().into_keys().collect();

        for info in self.remote.filesets().await? {
            if info.name == name || candidates.is_empty() {
                continue;
            }
            let (other, _) = self.remote.fetch_fileset(&info.name).await?;
            for digest in other.root.digest_map().into_keys() {
                candidates.remove(&digest);
            }
        }

        for digest in &candidates {
            self.remote.delete_blob(digest).await?;
        }
        self.remote.delete_fileset(name).await?;

        info!(fileset = name, blobs_deleted = candidates.len(), "Deleted fileset");
        Ok(DeleteReport {
            fileset: name.to_string(),
            blobs_deleted: candidates.len(),
        })
    }
}

/// Names of every workspace stored under the configured key prefix
pub async fn list_workspaces(config: &SyncConfig, store: &dyn ObjectStore) -> Result<Vec<String>, SyncError> {
    Ok(remote::list_workspaces(store, &config.remote.key_prefix).await?)
}

fn validate_workspace_name(name: &str) -> Result<(), SyncError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(SyncError::ConfigError(format!("Invalid workspace name '{}'", name)));
    }
    Ok(())
}

/// Fileset names become object keys and local file names.
pub(super) fn validate_fileset_name(name: &str) -> Result<(), SyncError> {
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
        || name == crate::store::snapshots::CURRENT_POINTER;
    if invalid {
        return Err(SyncError::InvalidFilesetName(name.to_string()));
    }
    Ok(())
}
