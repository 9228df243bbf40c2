//! Random tree generation

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use setsync::tree::Entry;
use setsync::types::Digest;

/// Relative paths drawn from a small alphabet so that trees overlap.
pub fn paths_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    let segment = prop::sample::select(vec!["a", "b", "c", "d.txt"]).prop_map(str::to_string);
    prop::collection::vec(prop::collection::vec(segment, 1..4), 0..12)
}

/// Tree holding every path as a file (with directories for its prefixes).
/// Paths that would need a file to act as a directory are skipped.
pub fn build_tree(paths: &[Vec<String>], content_seed: u8) -> Entry {
    let at = |secs: i64| Utc.timestamp_opt(secs, 0).unwrap();
    let mut root = Entry::directory(0o755, at(1_600_000_000));

    'paths: for path in paths {
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        for depth in 1..segments.len() {
            match root.get(&segments[..depth]) {
                Some(existing) if !existing.is_dir() => continue 'paths,
                Some(_) => {}
                None => root
                    .insert_at(&segments[..depth], Entry::directory(0o755, at(1_600_000_000)))
                    .unwrap(),
            }
        }
        if root.get(&segments).is_none() {
            let tag = format!("{:02x}{}", content_seed, segments.join("-").len());
            let digest = Digest::from_hex(tag);
            let file = Entry::file(0o644, at(1_600_000_000 + content_seed as i64), 4, Some(digest));
            root.insert_at(&segments, file).unwrap();
        }
    }
    root
}

pub fn pattern_strategy() -> impl Strategy<Value = Vec<String>> {
    let pattern = prop::sample::select(vec!["a", "a/*", "b/*", "*/c", "*", "*/*", "c/*/d.txt", "[ab]/*"])
        .prop_map(str::to_string);
    prop::collection::vec(pattern, 1..3)
}
