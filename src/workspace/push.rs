//! Publishing the workspace as a new remote fileset

use crate::error::{SyncError, TransferError};
use crate::transfer::TransferItem;
use crate::tree::builder::TreeBuilder;
use crate::tree::entry::Entry;
use crate::tree::path;
use crate::types::Digest;
use crate::workspace::facade::{validate_fileset_name, Workspace};
use crate::workspace::types::{PushOptions, PushReport};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

impl Workspace {
    /// Snapshot the workspace, upload content the remote lacks and publish
    /// the snapshot as `name`.
    ///
    /// Blobs are uploaded before the snapshot is published, so a published
    /// fileset never references missing content. The local current pointer
    /// moves only after publication succeeds.
    #[instrument(skip(self, options), fields(workspace = %self.name, fileset = %name))]
    pub async fn push(&mut self, name: &str, options: &PushOptions) -> Result<PushReport, SyncError> {
        validate_fileset_name(name)?;
        let start = Instant::now();
        info!("Starting push");

        let baseline = self.snapshots.load_current()?;
        let built = TreeBuilder::new(self.builder_config(true))
            .with_reference(baseline.as_ref())
            .with_filter(&options.filter)
            .build()?;
        let mut file_set = built.file_set;
        let mut fresh_root: Option<Entry> = None;

        if options.merge && !options.filter.is_empty() {
            match &baseline {
                Some(base) => {
                    let merged = options.filter.merge_subset(&base.root, &file_set.root)?;
                    fresh_root = Some(file_set.root.clone());
                    file_set.replace_root(merged);
                    debug!(entries = file_set.count, "Merged filtered build into current snapshot");
                }
                None => warn!("No current snapshot to merge into; publishing the filtered build"),
            }
        }
        file_set.comment = options.comment.clone();

        let representatives = self.representatives(&file_set.root, fresh_root.as_ref());
        let digests = representatives.len();

        let remote = &self.remote;
        let checks: Vec<(Representative, Result<bool, TransferError>)> = stream::iter(representatives)
            .map(|rep| async move {
                let exists = remote.blob_exists(&rep.digest).await;
                (rep, exists)
            })
            .buffer_unordered(self.transfer.concurrency())
            .collect()
            .await;

        let mut uploads = Vec::new();
        let mut already_present = 0;
        for (rep, exists) in checks {
            if exists? {
                already_present += 1;
                continue;
            }
            let source = rep.source.ok_or_else(|| SyncError::MissingContent {
                path: rep.first_path.clone(),
                digest: rep.digest.to_string(),
            })?;
            uploads.push(TransferItem::Upload {
                source: path::key_to_path(&self.root, &source),
                key: self.remote.blob_key(&rep.digest),
                size: rep.size,
            });
        }
        let uploaded = uploads.len();
        info!(digests, uploads = uploaded, already_present, "Resolved remote content");

        let transfer = self.transfer.run(uploads).await?;

        let data = file_set.to_gz_json()?;
        self.remote.publish_fileset(name, data.clone()).await?;
        self.snapshots.store(name, &data)?;
        self.snapshots.set_current(name)?;

        info!(
            entries = file_set.count,
            size = file_set.size,
            bytes_uploaded = transfer.bytes,
            duration_ms = start.elapsed().as_millis(),
            "Push completed"
        );

        Ok(PushReport {
            fileset: name.to_string(),
            entries: file_set.count,
            size: file_set.size,
            digests,
            uploaded,
            already_present,
            bytes_uploaded: transfer.bytes,
            skipped: built.skipped,
        })
    }

    /// One local source per distinct digest of `root`.
    ///
    /// Paths of the fresh build qualify as they are. A path carried over from
    /// the baseline by a merge qualifies only while the file on disk still has
    /// the entry's size and modification time.
    fn representatives(&self, root: &Entry, fresh_root: Option<&Entry>) -> Vec<Representative> {
        let fresh = fresh_root.map(Entry::flatten);
        root.digest_map()
            .into_iter()
            .filter_map(|(digest, paths)| {
                let (first_path, first_entry) = paths.first()?;
                let is_fresh = |key: &str| match &fresh {
                    None => true,
                    Some(map) => map.get(key).and_then(|e| e.digest.as_ref()) == Some(&digest),
                };
                let source = paths
                    .iter()
                    .find(|(key, _)| is_fresh(key))
                    .or_else(|| paths.iter().find(|(key, entry)| self.unchanged_on_disk(key, entry)))
                    .map(|(key, _)| key.clone());
                if source.is_none() {
                    debug!(digest = %digest, path = %first_path, "No local source for carried-over content");
                }
                Some(Representative {
                    size: first_entry.size,
                    first_path: first_path.clone(),
                    source,
                    digest,
                })
            })
            .collect()
    }

    fn unchanged_on_disk(&self, key: &str, entry: &Entry) -> bool {
        match std::fs::symlink_metadata(path::key_to_path(&self.root, key)) {
            Ok(meta) => {
                meta.is_file()
                    && meta.len() == entry.size
                    && meta.modified().map(DateTime::<Utc>::from).ok() == Some(entry.mod_time)
            }
            Err(_) => false,
        }
    }
}

struct Representative {
    digest: Digest,
    size: u64,
    /// First path holding the digest, for diagnostics
    first_path: String,
    /// Path to upload from, when a trustworthy local copy exists
    source: Option<String>,
}
