//! Snapshot tree nodes
//!
//! Every node carries a mode and a modification time. Directories own their
//! children exclusively (name → Entry); regular files carry `size` and a
//! `digest` (present iff size > 0 and hashing was requested); symlinks carry
//! their `target`.

use crate::error::TreeError;
use crate::tree::entry_map::EntryMap;
use crate::tree::path;
use crate::types::{Digest, Mode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One filesystem node within a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub mode: Mode,

    #[serde(rename = "mtime")]
    pub mod_time: DateTime<Utc>,

    /// Children of a directory, keyed by name
    #[serde(rename = "_tree", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tree: BTreeMap<String, Entry>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub size: u64,

    #[serde(rename = "_digest", default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Entry {
    pub fn directory(perm: u32, mod_time: DateTime<Utc>) -> Self {
        Self {
            mode: Mode::directory(perm),
            mod_time,
            tree: BTreeMap::new(),
            size: 0,
            digest: None,
            target: None,
        }
    }

    pub fn file(perm: u32, mod_time: DateTime<Utc>, size: u64, digest: Option<Digest>) -> Self {
        Self {
            mode: Mode::regular(perm),
            mod_time,
            tree: BTreeMap::new(),
            size,
            digest,
            target: None,
        }
    }

    pub fn symlink(perm: u32, mod_time: DateTime<Utc>, target: impl Into<String>) -> Self {
        Self {
            mode: Mode::symlink(perm),
            mod_time,
            tree: BTreeMap::new(),
            size: 0,
            digest: None,
            target: Some(target.into()),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// A leaf is anything that is not a directory with children.
    pub fn is_leaf(&self) -> bool {
        !self.is_dir() || self.tree.is_empty()
    }

    /// Copy of this entry's metadata; a directory copy starts with no children.
    pub fn duplicate_metadata(&self) -> Entry {
        Entry {
            mode: self.mode,
            mod_time: self.mod_time,
            tree: BTreeMap::new(),
            size: self.size,
            digest: self.digest.clone(),
            target: self.target.clone(),
        }
    }

    /// Compare mode, time, size, digest and target (children are ignored).
    pub fn equal_metadata(&self, other: &Entry) -> bool {
        self.mode == other.mode
            && self.mod_time == other.mod_time
            && self.size == other.size
            && self.digest == other.digest
            && self.target == other.target
    }

    /// Overwrite this entry's metadata in place, keeping its children.
    pub fn update_metadata_from(&mut self, other: &Entry) {
        self.mode = other.mode;
        self.mod_time = other.mod_time;
        self.size = other.size;
        self.digest = other.digest.clone();
        self.target = other.target.clone();
    }

    /// Depth-first walk calling `visit(path, entry)` for this entry (path "")
    /// and every descendant, children in name order.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&str, &'a Entry),
    {
        visit("", self);
        walk_children("", self, &mut visit);
    }

    /// Relative paths of every leaf below this entry (the entry itself excluded).
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        self.walk(|full_path, entry| {
            if !full_path.is_empty() && entry.is_leaf() {
                leaves.push(full_path.to_string());
            }
        });
        leaves
    }

    /// Look up a descendant by path segments.
    pub fn get(&self, segments: &[&str]) -> Option<&Entry> {
        let mut current = self;
        for name in segments {
            current = current.tree.get(*name)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, segments: &[&str]) -> Option<&mut Entry> {
        let mut current = self;
        for name in segments {
            current = current.tree.get_mut(*name)?;
        }
        Some(current)
    }

    /// Insert `entry` at `segments`, replacing whatever is there.
    ///
    /// Every parent along the way must already exist; this never creates
    /// intermediate directories (see [`Entry::deep_insert`]).
    pub fn insert_at(&mut self, segments: &[&str], entry: Entry) -> Result<(), TreeError> {
        let (name, parents) = segments.split_last().ok_or(TreeError::EmptyPath)?;
        let parent = self
            .get_mut(parents)
            .ok_or_else(|| TreeError::MissingParent(segments.join("/")))?;
        parent.tree.insert((*name).to_string(), entry);
        Ok(())
    }

    /// Place the entry found at `segments` in `source` into this tree,
    /// materializing every ancestor from `source`'s metadata.
    ///
    /// Existing ancestors whose metadata differs from `source` are updated in
    /// place. The terminal node is replaced by a metadata copy of the source,
    /// unless both are directories, in which case only its metadata changes.
    pub fn deep_insert(&mut self, source: &EntryMap<'_>, segments: &[&str]) -> Result<(), TreeError> {
        if segments.is_empty() {
            return Err(TreeError::EmptyPath);
        }

        for depth in 1..=segments.len() {
            let prefix = &segments[..depth];
            let sub_path = prefix.join("/");
            let source_entry = source
                .get(sub_path.as_str())
                .copied()
                .ok_or_else(|| TreeError::MissingSourceEntry(sub_path.clone()))?;
            let terminal = depth == segments.len();

            match self.get_mut(prefix) {
                None => self.insert_at(prefix, source_entry.duplicate_metadata())?,
                Some(existing) => {
                    if terminal && !(existing.is_dir() && source_entry.is_dir()) {
                        *existing = source_entry.duplicate_metadata();
                    } else if !existing.equal_metadata(source_entry) {
                        existing.update_metadata_from(source_entry);
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of entries in this tree, including this one.
    pub fn count(&self) -> u64 {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// Sum of the sizes of every regular file in this tree.
    pub fn total_size(&self) -> u64 {
        let mut size = 0;
        self.walk(|_, entry| {
            if entry.mode.is_regular() {
                size += entry.size;
            }
        });
        size
    }
}

fn walk_children<'a, F>(parent_path: &str, entry: &'a Entry, visit: &mut F)
where
    F: FnMut(&str, &'a Entry),
{
    for (name, child) in &entry.tree {
        let child_path = path::join_key(parent_path, name);
        visit(&child_path, child);
        if !child.tree.is_empty() {
            walk_children(&child_path, child, visit);
        }
    }
}
