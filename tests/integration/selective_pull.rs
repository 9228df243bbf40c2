//! Filtered pulls, filtered pushes and merge pushes

use super::test_utils::{read_file, tree_listing, write_file, Harness};
use setsync::error::SyncError;
use setsync::filter::FileSetFilter;
use setsync::remote::ObjectStore;
use setsync::tree::hasher;
use setsync::workspace::{always_confirm, PullOutcome, PushOptions, Workspace};
use std::sync::Arc;

async fn seeded(h: &Harness) -> Workspace {
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "data/a.bin", "aaaa", 1_600_000_000);
    write_file(&root, "data/sub/b.bin", "bbbb", 1_600_000_000);
    write_file(&root, "other/c.txt", "cccc", 1_600_000_000);
    write_file(&root, "top.txt", "top", 1_600_000_000);
    ws.push("full", &PushOptions::default()).await.unwrap();
    ws
}

#[tokio::test]
async fn test_clone_with_filter_restores_matches_and_ancestors() {
    let h = Harness::new();
    seeded(&h).await;

    let filter = FileSetFilter::parse_list("data/*").unwrap();
    let (clone, outcome) = Workspace::clone_remote(
        &h.dir("clones"),
        "alpha",
        Some("full"),
        &filter,
        &h.config,
        Arc::clone(&h.store),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, PullOutcome::Completed(_)));

    // "data/sub" matches as a directory; its children do not.
    assert_eq!(
        tree_listing(clone.root()),
        vec!["data", "data/a.bin", "data/sub"]
    );
    assert_eq!(read_file(clone.root(), "data/a.bin"), "aaaa");
    assert_eq!(clone.recorded_patterns(), ["data/*".to_string()]);
}

#[tokio::test]
async fn test_filtered_pull_replaces_workspace() {
    let h = Harness::new();
    let mut ws = seeded(&h).await;

    let filter = FileSetFilter::parse_list("data/*,data/*/*").unwrap();
    let outcome = ws.pull("full", &filter, &mut always_confirm).await.unwrap();
    assert!(matches!(outcome, PullOutcome::Completed(_)));
    assert_eq!(
        tree_listing(ws.root()),
        vec!["data", "data/a.bin", "data/sub", "data/sub/b.bin"]
    );
    assert_eq!(read_file(ws.root(), "data/sub/b.bin"), "bbbb");

    let other = FileSetFilter::parse_list("top.txt").unwrap();
    ws.pull("full", &other, &mut always_confirm).await.unwrap();
    assert_eq!(tree_listing(ws.root()), vec!["top.txt"]);
    assert_eq!(
        ws.recorded_patterns(),
        ["top.txt".to_string(), "data/*".to_string(), "data/*/*".to_string()]
    );
}

#[tokio::test]
async fn test_filtered_push_publishes_subset() {
    let h = Harness::new();
    let mut ws = seeded(&h).await;

    let options = PushOptions {
        filter: FileSetFilter::parse_list("other/*").unwrap(),
        ..PushOptions::default()
    };
    let report = ws.push("others", &options).await.unwrap();
    // root, other, other/c.txt
    assert_eq!(report.entries, 3);
    assert_eq!(report.size, 4);

    let (set, _) = h.remote("alpha").fetch_fileset("others").await.unwrap();
    let leaves = set.root.leaf_paths();
    assert_eq!(leaves, vec!["other/c.txt".to_string()]);
}

#[tokio::test]
async fn test_merge_push_keeps_unselected_paths() {
    let h = Harness::new();
    let mut ws = seeded(&h).await;
    let root = ws.root().to_path_buf();

    write_file(&root, "data/a.bin", "AAAA-new", 1_600_000_900);
    write_file(&root, "top.txt", "local edit not published", 1_600_000_900);

    let options = PushOptions {
        comment: "data refresh".to_string(),
        filter: FileSetFilter::parse_list("data/*").unwrap(),
        merge: true,
    };
    ws.push("merged", &options).await.unwrap();

    let (set, _) = h.remote("alpha").fetch_fileset("merged").await.unwrap();
    assert_eq!(set.comment, "data refresh");
    let map = set.root.flatten();
    assert_eq!(map["data/a.bin"].size, 8);
    assert_eq!(map["top.txt"].size, 3);
    assert!(map.contains_key("data/sub/b.bin"));
    assert!(map.contains_key("other/c.txt"));
}

#[tokio::test]
async fn test_merge_push_uploads_from_freshly_built_path() {
    let h = Harness::new();
    let mut ws = seeded(&h).await;
    let root = ws.root().to_path_buf();
    let remote = h.remote("alpha");
    let digest = hasher::digest_bytes(b"cccc");
    remote.delete_blob(&digest).await.unwrap();

    // The carried-over path no longer holds the recorded bytes.
    write_file(&root, "other/c.txt", "XXXX", 1_600_000_900);
    write_file(&root, "zz/copy.bin", "cccc", 1_600_000_900);

    let options = PushOptions {
        filter: FileSetFilter::parse_list("zz/*").unwrap(),
        merge: true,
        ..PushOptions::default()
    };
    let report = ws.push("merged", &options).await.unwrap();
    assert_eq!(report.uploaded, 1);

    let bytes = h.store.get(&remote.blob_key(&digest)).await.unwrap();
    assert_eq!(bytes, b"cccc");
}

#[tokio::test]
async fn test_merge_push_without_local_source_fails() {
    let h = Harness::new();
    let mut ws = seeded(&h).await;
    let root = ws.root().to_path_buf();
    let remote = h.remote("alpha");
    remote.delete_blob(&hasher::digest_bytes(b"top")).await.unwrap();
    write_file(&root, "top.txt", "edited", 1_600_000_900);

    let options = PushOptions {
        filter: FileSetFilter::parse_list("data/*").unwrap(),
        merge: true,
        ..PushOptions::default()
    };
    let err = ws.push("merged", &options).await.unwrap_err();
    match err {
        SyncError::MissingContent { path, .. } => assert_eq!(path, "top.txt"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(remote.fetch_fileset("merged").await.is_err());
    assert_eq!(ws.current_fileset().unwrap().as_deref(), Some("full"));
}
