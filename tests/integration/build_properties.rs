//! Tree builder determinism and digest reuse against real directories

use super::test_utils::write_file;
use setsync::filter::FileSetFilter;
use setsync::tree::{BuilderConfig, TreeBuilder};
use tempfile::TempDir;

fn populated() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.txt", "alpha", 1_600_000_000);
    write_file(temp.path(), "dir/b.txt", "beta", 1_600_000_000);
    write_file(temp.path(), "dir/nested/c.txt", "gamma", 1_600_000_000);
    temp
}

#[test]
fn test_unchanged_tree_builds_identically() {
    let temp = populated();
    let builder = TreeBuilder::new(BuilderConfig::new(temp.path()));

    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert!(first.file_set.same_content(&second.file_set));
    assert_eq!(first.file_set.count, 6);
    assert_eq!(first.file_set.size, 14);
    assert!(first.skipped.is_empty());
}

#[test]
fn test_reference_snapshot_avoids_rehashing() {
    let temp = populated();
    let first = TreeBuilder::new(BuilderConfig::new(temp.path())).build().unwrap();
    assert_eq!(first.stats.hashed, 3);
    assert_eq!(first.stats.reused, 0);

    let second = TreeBuilder::new(BuilderConfig::new(temp.path()))
        .with_reference(Some(&first.file_set))
        .build()
        .unwrap();
    assert_eq!(second.stats.hashed, 0);
    assert_eq!(second.stats.reused, 3);
    assert!(first.file_set.same_content(&second.file_set));

    write_file(temp.path(), "dir/b.txt", "BETA", 1_600_000_001);
    let third = TreeBuilder::new(BuilderConfig::new(temp.path()))
        .with_reference(Some(&first.file_set))
        .build()
        .unwrap();
    assert_eq!(third.stats.hashed, 1);
    assert_eq!(third.stats.reused, 2);
    assert!(!first.file_set.same_content(&third.file_set));
}

#[test]
fn test_same_mtime_different_content_reuses_stale_digest() {
    // Reuse is keyed on modification time alone.
    let temp = populated();
    let first = TreeBuilder::new(BuilderConfig::new(temp.path())).build().unwrap();

    write_file(temp.path(), "a.txt", "ALPHA", 1_600_000_000);
    let second = TreeBuilder::new(BuilderConfig::new(temp.path()))
        .with_reference(Some(&first.file_set))
        .build()
        .unwrap();
    let old = first.file_set.root.flatten();
    let new = second.file_set.root.flatten();
    assert_eq!(old["a.txt"].digest, new["a.txt"].digest);
}

#[test]
fn test_filtered_build_with_reference() {
    let temp = populated();
    let first = TreeBuilder::new(BuilderConfig::new(temp.path())).build().unwrap();
    let filter = FileSetFilter::parse_list("dir/*/*").unwrap();

    let subset = TreeBuilder::new(BuilderConfig::new(temp.path()))
        .with_reference(Some(&first.file_set))
        .with_filter(&filter)
        .build()
        .unwrap();
    assert_eq!(subset.file_set.root.leaf_paths(), vec!["dir/nested/c.txt".to_string()]);
    assert_eq!(subset.file_set.count, 4);
    assert_eq!(subset.file_set.size, 5);
}

#[test]
fn test_build_without_digests() {
    let temp = populated();
    let mut config = BuilderConfig::new(temp.path());
    config.gen_digest = false;
    let result = TreeBuilder::new(config).build().unwrap();
    let map = result.file_set.root.flatten();
    assert!(map.values().all(|entry| entry.digest.is_none()));
    assert_eq!(result.stats.hashed, 0);
}
