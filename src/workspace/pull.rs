//! Replacing the workspace with a remote fileset
//!
//! A pull never loses content it can keep: local files that match neither a
//! local change nor missing content are moved into the object cache before
//! the workspace is wiped, and rebuilt from there. Every blob the target
//! needs is downloaded and verified before the workspace is touched.

use crate::diff::{self, EntryMapDiff};
use crate::error::SyncError;
use crate::filter::FileSetFilter;
use crate::transfer::TransferItem;
use crate::tree::builder::TreeBuilder;
use crate::tree::entry_map::EntryMap;
use crate::tree::hasher;
use crate::tree::path;
use crate::types::Digest;
use crate::workspace::facade::{validate_fileset_name, Workspace};
use crate::workspace::rebuild;
use crate::workspace::types::{ConfirmChanges, PendingChanges, PullOutcome, PullReport};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A local file to move into the object cache before the wipe
#[derive(Debug)]
struct Preserved {
    path: PathBuf,
    digest: Digest,
}

impl Workspace {
    /// Make the workspace match fileset `name`, restricted to `filter` when
    /// it is non-empty.
    ///
    /// Local additions and modifications (relative to the current snapshot,
    /// or to the target when there is none) are reported to `confirm` first;
    /// a refusal returns [`PullOutcome::Declined`] with nothing modified.
    #[instrument(skip(self, filter, confirm), fields(workspace = %self.name, fileset = %name))]
    pub async fn pull(
        &mut self,
        name: &str,
        filter: &FileSetFilter,
        confirm: &mut dyn ConfirmChanges,
    ) -> Result<PullOutcome, SyncError> {
        validate_fileset_name(name)?;
        let start = Instant::now();
        info!("Starting pull");

        let local = TreeBuilder::new(self.builder_config(false)).build()?;
        let local_map = local.file_set.root.flatten();
        let cached = self.snapshots.load_current()?;
        let cached_map = cached.as_ref().map(|fs| fs.root.flatten());

        let (remote_set, raw) = self.remote.fetch_fileset(name).await?;
        let remote_map = remote_set.root.flatten();
        let target = filter.select_with_ancestors(&remote_map);
        debug!(entries = target.len(), "Resolved target entries");

        let baseline = match cached_map.as_ref() {
            Some(map) => map,
            None => {
                warn!("No local snapshot; comparing the workspace against the target");
                &target
            }
        };
        let changes = diff::diff(baseline, &local_map).filter(filter);

        if changes.has_local_changes() {
            let pending = PendingChanges {
                root: self.root.clone(),
                added: changes.added.keys().cloned().collect(),
                updated: changes.updated.keys().cloned().collect(),
            };
            if !confirm.confirm(&pending) {
                info!("Pull declined; workspace left unchanged");
                return Ok(PullOutcome::Declined(pending));
            }
        }

        if !filter.is_empty() {
            self.patterns.record(&filter.patterns())?;
        }

        let preserved = self.plan_preservation(&local_map, cached_map.as_ref(), &changes)?;
        let preserved_digests: HashSet<&Digest> = preserved.iter().map(|p| &p.digest).collect();

        let mut missing: BTreeMap<Digest, u64> = BTreeMap::new();
        for entry in target.values() {
            if let Some(digest) = &entry.digest {
                if !self.objects.contains(digest) && !preserved_digests.contains(digest) {
                    missing.insert(digest.clone(), entry.size);
                }
            }
        }
        info!(
            preserved = preserved.len(),
            missing = missing.len(),
            "Planned content resolution"
        );

        let (downloaded, bytes_downloaded) = self.download(&missing).await?;

        for entry in target.values() {
            if let Some(digest) = &entry.digest {
                if !self.objects.contains(digest) && !preserved_digests.contains(digest) {
                    return Err(SyncError::MissingContent {
                        path: local_path_hint(&target, digest),
                        digest: digest.to_string(),
                    });
                }
            }
        }

        for item in &preserved {
            self.objects.adopt(&item.digest, &item.path)?;
        }

        rebuild::wipe(&self.root, &self.ignore_names())?;
        let restored = rebuild::rebuild(&self.root, &target, &self.objects)?;

        self.snapshots.store(name, &raw)?;
        self.snapshots.set_current(name)?;

        let protected: HashSet<Digest> = target
            .values()
            .filter_map(|entry| entry.digest.clone())
            .collect();
        let eviction = self.objects.evict(self.settings.cache_limit, &protected)?;

        info!(
            entries = target.len(),
            downloaded,
            restored,
            duration_ms = start.elapsed().as_millis(),
            "Pull completed"
        );

        Ok(PullOutcome::Completed(PullReport {
            fileset: name.to_string(),
            entries: target.len(),
            downloaded,
            bytes_downloaded,
            preserved: preserved.len(),
            restored,
            eviction,
        }))
    }

    /// Local regular files worth keeping across the wipe: not a local change,
    /// not already cached, one per digest. A cached digest is reused when the
    /// modification time is unchanged; otherwise the file is hashed.
    fn plan_preservation(
        &self,
        local: &EntryMap<'_>,
        cached: Option<&EntryMap<'_>>,
        changes: &EntryMapDiff<'_>,
    ) -> Result<Vec<Preserved>, SyncError> {
        let mut seen: HashSet<Digest> = HashSet::new();
        let mut plan = Vec::new();

        for (key, entry) in local {
            if !entry.mode.is_regular() || entry.size == 0 {
                continue;
            }
            if changes.touches(key) {
                debug!(path = %key, "Not preserving locally changed file");
                continue;
            }

            let file_path = path::key_to_path(&self.root, key);
            let known = cached
                .and_then(|map| map.get(key))
                .filter(|known| known.mod_time == entry.mod_time)
                .and_then(|known| known.digest.clone());
            let digest = match known {
                Some(digest) => digest,
                None => hasher::digest_file(&file_path)?,
            };

            if self.objects.contains(&digest) || !seen.insert(digest.clone()) {
                continue;
            }
            plan.push(Preserved {
                path: file_path,
                digest,
            });
        }
        Ok(plan)
    }

    /// Fetch `missing` into the object cache. On failure every blob of the
    /// batch is removed again.
    async fn download(&self, missing: &BTreeMap<Digest, u64>) -> Result<(usize, u64), SyncError> {
        if missing.is_empty() {
            return Ok((0, 0));
        }

        let items: Vec<TransferItem> = missing
            .iter()
            .map(|(digest, size)| TransferItem::Download {
                key: self.remote.blob_key(digest),
                dest: self.objects.partial_path(digest),
                size: *size,
            })
            .collect();

        let result = self.transfer.run(items).await;
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Download failed; removing partial content");
                self.discard(missing);
                return Err(e.into());
            }
        };

        for digest in missing.keys() {
            if let Err(e) = self.objects.commit_partial(digest) {
                self.discard(missing);
                return Err(e.into());
            }
        }
        Ok((report.completed, report.bytes))
    }

    fn discard(&self, digests: &BTreeMap<Digest, u64>) {
        for digest in digests.keys() {
            if let Err(e) = self.objects.remove(digest) {
                warn!(digest = %digest, error = %e, "Failed to remove downloaded content");
            }
        }
    }
}

fn local_path_hint(target: &EntryMap<'_>, digest: &Digest) -> String {
    target
        .iter()
        .find(|(_, entry)| entry.digest.as_ref() == Some(digest))
        .map(|(key, _)| key.clone())
        .unwrap_or_default()
}
