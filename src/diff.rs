//! Change detection between two flattened snapshots

use crate::filter::FileSetFilter;
use crate::tree::entry::Entry;
use crate::tree::entry_map::EntryMap;

/// Paths added, removed or updated going from an old map to a new one
#[derive(Debug, Clone, Default)]
pub struct EntryMapDiff<'a> {
    /// In new, absent from old
    pub added: EntryMap<'a>,
    /// In old, absent from new (entries borrowed from old)
    pub removed: EntryMap<'a>,
    /// In both and changed (entries borrowed from new)
    pub updated: EntryMap<'a>,
}

/// An entry changed if its symlink target or mode differs, or, for a regular
/// file, its modification time differs at whole-second resolution.
///
/// Directory and symlink times are not compared.
pub fn is_updated(old: &Entry, new: &Entry) -> bool {
    if old.target != new.target || old.mode != new.mode {
        return true;
    }
    new.mode.is_regular() && old.mod_time.timestamp() != new.mod_time.timestamp()
}

/// Compare two maps. Every path of either map lands in exactly one of added,
/// removed, updated or unchanged.
pub fn diff<'a>(old: &EntryMap<'a>, new: &EntryMap<'a>) -> EntryMapDiff<'a> {
    let mut result = EntryMapDiff::default();

    for (key, new_entry) in new {
        match old.get(key) {
            None => {
                result.added.insert(key.clone(), *new_entry);
            }
            Some(old_entry) if is_updated(old_entry, new_entry) => {
                result.updated.insert(key.clone(), *new_entry);
            }
            Some(_) => {}
        }
    }

    for (key, old_entry) in old {
        if !new.contains_key(key) {
            result.removed.insert(key.clone(), *old_entry);
        }
    }

    result
}

impl<'a> EntryMapDiff<'a> {
    /// Restrict every category to paths matching `filter`. An empty filter
    /// keeps everything.
    pub fn filter(&self, filter: &FileSetFilter) -> EntryMapDiff<'a> {
        if filter.is_empty() {
            return self.clone();
        }
        let keep = |map: &EntryMap<'a>| -> EntryMap<'a> {
            map.iter()
                .filter(|(key, _)| filter.matches(key))
                .map(|(key, entry)| (key.clone(), *entry))
                .collect()
        };
        EntryMapDiff {
            added: keep(&self.added),
            removed: keep(&self.removed),
            updated: keep(&self.updated),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// True when applying a snapshot over the new side would lose local data.
    pub fn has_local_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }

    /// Whether `key` was added or updated
    pub fn touches(&self, key: &str) -> bool {
        self.added.contains_key(key) || self.updated.contains_key(key)
    }
}
