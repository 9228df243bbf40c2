//! Inputs and outcomes of workspace operations

use crate::filter::FileSetFilter;
use crate::store::EvictionReport;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub comment: String,
    /// Restrict the published snapshot to matching paths
    pub filter: FileSetFilter,
    /// Carry the unselected part of the current snapshot forward
    pub merge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub fileset: String,
    pub entries: u64,
    pub size: u64,
    /// Distinct content digests in the published snapshot
    pub digests: usize,
    /// Blobs sent by this push
    pub uploaded: usize,
    /// Blobs the remote already held
    pub already_present: usize,
    pub bytes_uploaded: u64,
    /// Irregular files left out of the snapshot
    pub skipped: Vec<PathBuf>,
}

/// Local modifications a pull would discard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub root: PathBuf,
    /// Paths created locally that the pull will delete
    pub added: Vec<String>,
    /// Paths modified locally that the pull will overwrite
    pub updated: Vec<String>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    pub fileset: String,
    pub entries: usize,
    pub downloaded: usize,
    pub bytes_downloaded: u64,
    /// Local files moved into the cache before the wipe
    pub preserved: usize,
    /// Files materialized from the cache
    pub restored: usize,
    pub eviction: EvictionReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Completed(PullReport),
    /// The user refused to discard local changes; nothing was modified.
    Declined(PendingChanges),
}

/// Decides whether a pull may discard local changes
pub trait ConfirmChanges {
    fn confirm(&mut self, changes: &PendingChanges) -> bool;
}

impl<F> ConfirmChanges for F
where
    F: FnMut(&PendingChanges) -> bool,
{
    fn confirm(&mut self, changes: &PendingChanges) -> bool {
        self(changes)
    }
}

/// Accepts every change without asking
pub fn always_confirm(_changes: &PendingChanges) -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub workspace: String,
    pub root: PathBuf,
    pub current: Option<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub fileset: String,
    /// Blobs referenced only by the deleted fileset
    pub blobs_deleted: usize,
}
