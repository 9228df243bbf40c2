//! Flattened views over a snapshot tree
//!
//! An [`EntryMap`] maps root-relative `/`-separated paths to borrowed entries
//! of the originating tree. A [`DigestMap`] groups regular files by content
//! digest so identical bytes are transferred once.

use crate::tree::entry::Entry;
use crate::types::Digest;
use std::collections::BTreeMap;

/// Relative path → entry, borrowed from the tree it was flattened from
pub type EntryMap<'a> = BTreeMap<String, &'a Entry>;

/// Content digest → every path in one tree holding those bytes
pub type DigestMap<'a> = BTreeMap<Digest, Vec<(String, &'a Entry)>>;

impl Entry {
    /// Flatten this tree into path → entry for every descendant.
    ///
    /// The entry itself (path "") is not included; directory entries keep
    /// their children.
    pub fn flatten(&self) -> EntryMap<'_> {
        let mut map = EntryMap::new();
        self.walk(|full_path, entry| {
            if !full_path.is_empty() {
                map.insert(full_path.to_string(), entry);
            }
        });
        map
    }

    /// Group every file that has a digest by that digest. Empty files carry
    /// no digest and are omitted.
    pub fn digest_map(&self) -> DigestMap<'_> {
        let mut digests = DigestMap::new();
        self.walk(|full_path, entry| {
            if let Some(digest) = &entry.digest {
                digests
                    .entry(digest.clone())
                    .or_default()
                    .push((full_path.to_string(), entry));
            }
        });
        digests
    }

    /// Entries of this tree whose digest does not appear in `known`.
    pub fn missing_digests(&self, known: &DigestMap<'_>) -> DigestMap<'_> {
        let mut missing = DigestMap::new();
        self.walk(|full_path, entry| {
            if let Some(digest) = &entry.digest {
                if !known.contains_key(digest) {
                    missing
                        .entry(digest.clone())
                        .or_default()
                        .push((full_path.to_string(), entry));
                }
            }
        });
        missing
    }
}
