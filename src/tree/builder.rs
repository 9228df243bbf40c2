//! Tree builder for constructing snapshot trees from the filesystem

use crate::error::{StorageError, SyncError};
use crate::filter::FileSetFilter;
use crate::tree::entry::Entry;
use crate::tree::entry_map::EntryMap;
use crate::tree::fileset::FileSet;
use crate::tree::hasher;
use crate::tree::path;
use crate::tree::walker::{NodeKind, WalkEntry, Walker, WalkerConfig};
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

/// Options controlling a single build
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub root: PathBuf,
    /// Hash regular file contents. Without it only metadata is recorded.
    pub gen_digest: bool,
    /// Accept symlinks resolving outside the root (with a warning).
    pub allow_external_links: bool,
    /// Names skipped at every level
    pub ignore_names: Vec<String>,
}

impl BuilderConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gen_digest: true,
            allow_external_links: false,
            ignore_names: Vec::new(),
        }
    }
}

/// Counters gathered while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Files whose content was read and hashed
    pub hashed: u64,
    /// Files whose digest was taken from the reference snapshot
    pub reused: u64,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub file_set: FileSet,
    /// Paths that are neither directory, regular file nor symlink
    pub skipped: Vec<PathBuf>,
    pub stats: BuildStats,
}

/// Builds a [`FileSet`] by walking a directory tree
///
/// With a reference snapshot, a file whose mtime matches its reference entry
/// exactly takes the reference digest without being read. With both a
/// reference and a non-empty filter, the result is restricted to the matching
/// leaves and their ancestors.
pub struct TreeBuilder<'a> {
    config: BuilderConfig,
    reference: Option<&'a FileSet>,
    filter: Option<&'a FileSetFilter>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            reference: None,
            filter: None,
        }
    }

    pub fn with_reference(mut self, reference: Option<&'a FileSet>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_filter(mut self, filter: &'a FileSetFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[instrument(skip(self), fields(root = %self.config.root.display(), digest = self.config.gen_digest))]
    pub fn build(&self) -> Result<BuildResult, SyncError> {
        let start = Instant::now();
        debug!("Starting tree build");

        let root = path::canonicalize_root(&self.config.root)?;
        let root_meta = std::fs::metadata(&root)?;
        if !root_meta.is_dir() {
            return Err(StorageError::NotADirectory(root).into());
        }

        let walker = Walker::with_config(
            root.clone(),
            WalkerConfig {
                ignore_names: self.config.ignore_names.clone(),
            },
        );
        let walked = walker.walk().map_err(|e| {
            error!("Filesystem walk failed: {}", e);
            e
        })?;
        debug!(entry_count = walked.len(), "Walked filesystem");

        let reference_map: Option<EntryMap<'_>> = self.reference.map(|fs| fs.root.flatten());

        let mut tree = Entry::directory(permission_bits(&root_meta), modified(&root_meta)?);
        let mut skipped = Vec::new();
        let mut stats = BuildStats::default();

        for item in &walked {
            let entry = match item.kind {
                NodeKind::Directory => {
                    Entry::directory(permission_bits(&item.metadata), modified(&item.metadata)?)
                }
                NodeKind::File => self.file_entry(item, reference_map.as_ref(), &mut stats)?,
                NodeKind::Symlink => self.symlink_entry(&root, item)?,
                NodeKind::Other => {
                    warn!(path = %item.path.display(), "Skipping irregular file");
                    skipped.push(item.path.clone());
                    continue;
                }
            };

            let segments = path::split_key(&item.key);
            tree.insert_at(&segments, entry).map_err(|e| {
                StorageError::Walk(format!("Out-of-order walk at {}: {}", item.key, e))
            })?;
        }

        if let (Some(_), Some(filter)) = (self.reference, self.filter) {
            if !filter.is_empty() {
                tree = filter.extract_subset(&tree)?;
            }
        }

        let file_set = FileSet::from_root(tree);
        info!(
            entries = file_set.count,
            size = file_set.size,
            hashed = stats.hashed,
            reused = stats.reused,
            skipped = skipped.len(),
            duration_ms = start.elapsed().as_millis(),
            "Tree build completed"
        );

        Ok(BuildResult {
            file_set,
            skipped,
            stats,
        })
    }

    fn file_entry(
        &self,
        item: &WalkEntry,
        reference: Option<&EntryMap<'_>>,
        stats: &mut BuildStats,
    ) -> Result<Entry, SyncError> {
        let size = item.metadata.len();
        let mod_time = modified(&item.metadata)?;

        let digest = if size > 0 && self.config.gen_digest {
            let reused = reference
                .and_then(|map| map.get(item.key.as_str()))
                .filter(|known| known.mod_time == mod_time)
                .and_then(|known| known.digest.clone());
            match reused {
                Some(digest) => {
                    trace!(path = %item.key, "Reusing digest");
                    stats.reused += 1;
                    Some(digest)
                }
                None => {
                    trace!(path = %item.key, "Hashing file");
                    stats.hashed += 1;
                    Some(hasher::digest_file(&item.path)?)
                }
            }
        } else {
            None
        };

        Ok(Entry::file(
            permission_bits(&item.metadata),
            mod_time,
            size,
            digest,
        ))
    }

    fn symlink_entry(&self, root: &Path, item: &WalkEntry) -> Result<Entry, SyncError> {
        let target = std::fs::read_link(&item.path)?;
        let target_str = target
            .to_str()
            .ok_or_else(|| {
                StorageError::InvalidPath(format!(
                    "Non UTF-8 symlink target at {}",
                    item.path.display()
                ))
            })?
            .to_string();

        // Relative targets resolve from the link's own directory, as the OS does.
        let link_dir = item.path.parent().unwrap_or(root);
        let resolved = path::normalize_lexically(&link_dir.join(&target));
        if !resolved.starts_with(root) {
            if self.config.allow_external_links {
                warn!(
                    path = %item.path.display(),
                    target = %target_str,
                    "Symbolic link points outside the workspace"
                );
            } else {
                return Err(StorageError::ExternalSymlink {
                    path: item.path.clone(),
                    target: target_str,
                }
                .into());
            }
        }

        Ok(Entry::symlink(
            permission_bits(&item.metadata),
            modified(&item.metadata)?,
            target_str,
        ))
    }
}

fn modified(metadata: &Metadata) -> Result<DateTime<Utc>, StorageError> {
    Ok(DateTime::<Utc>::from(metadata.modified()?))
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & crate::types::Mode::PERM_MASK
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}
