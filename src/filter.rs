//! Glob-based selection over snapshot trees
//!
//! Patterns match whole root-relative paths. `*` and `?` never cross a `/`, so
//! `data/*` selects the direct children of `data` only.

use crate::error::{SyncError, TreeError};
use crate::tree::entry::Entry;
use crate::tree::entry_map::EntryMap;
use crate::tree::path;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// An ordered set of glob patterns; a path matches if any pattern does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSetFilter {
    patterns: Vec<Pattern>,
}

impl FileSetFilter {
    /// Compile every pattern, failing on the first malformed one.
    pub fn new<I, S>(patterns: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Pattern::new(raw).map_err(|e| SyncError::InvalidPattern {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Parse a comma-separated pattern list; blank items are dropped.
    pub fn parse_list(list: &str) -> Result<Self, SyncError> {
        Self::new(list.split(',').map(str::trim).filter(|p| !p.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The patterns as originally written, in order
    pub fn patterns(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.as_str().to_string()).collect()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    /// New tree holding only the matching leaves of `root` plus their
    /// ancestors, all with metadata copied from `root`.
    pub fn extract_subset(&self, root: &Entry) -> Result<Entry, TreeError> {
        let selected: Vec<String> = root
            .leaf_paths()
            .into_iter()
            .filter(|leaf| self.matches(leaf))
            .collect();
        make_new_tree(root, &selected)
    }

    /// Replace the matching part of `baseline` with `overlay`.
    ///
    /// Leaves of `baseline` that do not match survive unchanged; every leaf of
    /// `overlay` is then inserted, with ancestors taking `overlay`'s metadata.
    pub fn merge_subset(&self, baseline: &Entry, overlay: &Entry) -> Result<Entry, TreeError> {
        let kept: Vec<String> = baseline
            .leaf_paths()
            .into_iter()
            .filter(|leaf| !self.matches(leaf))
            .collect();
        let mut merged = make_new_tree(baseline, &kept)?;

        let overlay_map = overlay.flatten();
        for leaf in overlay.leaf_paths() {
            merged.deep_insert(&overlay_map, &path::split_key(&leaf))?;
        }
        Ok(merged)
    }

    /// Matching entries of `map` plus every ancestor of each match present in
    /// `map`. An empty filter selects everything.
    pub fn select_with_ancestors<'a>(&self, map: &EntryMap<'a>) -> EntryMap<'a> {
        if self.is_empty() {
            return map.clone();
        }

        let mut selected = EntryMap::new();
        for (key, entry) in map {
            if !self.matches(key) {
                continue;
            }
            selected.insert(key.clone(), *entry);
            for ancestor in path::ancestor_keys(key) {
                if let Some(parent) = map.get(&ancestor) {
                    selected.insert(ancestor, *parent);
                }
            }
        }
        selected
    }
}

/// Build a tree rooted at a metadata copy of `source` containing exactly the
/// given paths of `source` and their ancestors.
pub fn make_new_tree(source: &Entry, paths: &[String]) -> Result<Entry, TreeError> {
    let source_map = source.flatten();
    let mut tree = source.duplicate_metadata();
    for leaf in paths {
        tree.deep_insert(&source_map, &path::split_key(leaf))?;
    }
    Ok(tree)
}
