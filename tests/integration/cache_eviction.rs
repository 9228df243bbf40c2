//! Object cache bounds after pull

use super::test_utils::{write_file, Harness};
use setsync::filter::FileSetFilter;
use setsync::tree::hasher;
use setsync::workspace::{always_confirm, PullOutcome, PushOptions, Workspace};
use std::sync::Arc;

#[tokio::test]
async fn test_pull_evicts_unreferenced_blobs_over_limit() {
    let h = Harness::with_cache_limit(10);
    let mut source = h.init("source", "alpha").await;
    let root = source.root().to_path_buf();
    write_file(&root, "f1.dat", &"1".repeat(100), 1_600_000_000);
    write_file(&root, "f2.dat", &"2".repeat(100), 1_600_000_000);
    source.push("v1", &PushOptions::default()).await.unwrap();

    std::fs::remove_file(root.join("f1.dat")).unwrap();
    std::fs::remove_file(root.join("f2.dat")).unwrap();
    write_file(&root, "f3.dat", &"3".repeat(100), 1_600_000_000);
    source.push("v2", &PushOptions::default()).await.unwrap();

    let (mut clone, _) = Workspace::clone_remote(
        &h.dir("clones"),
        "alpha",
        Some("v1"),
        &FileSetFilter::default(),
        &h.config,
        Arc::clone(&h.store),
    )
    .await
    .unwrap();

    // f1 and f2 are kept from the workspace, f3 is fetched and placed.
    let outcome = clone
        .pull("v2", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap();
    let report = match outcome {
        PullOutcome::Completed(report) => report,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(report.preserved, 2);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.eviction.removed.len(), 2);
    assert_eq!(report.eviction.freed, 200);

    let d1 = hasher::digest_bytes("1".repeat(100).as_bytes());
    assert!(!clone.objects().contains(&d1));
    assert!(clone.objects().total_size().unwrap() <= 10);
}

#[tokio::test]
async fn test_cache_within_limit_serves_later_pulls() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "f1.dat", "first", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();
    write_file(&root, "f1.dat", "second", 1_600_000_100);
    ws.push("v2", &PushOptions::default()).await.unwrap();

    ws.pull("v1", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap();
    let d2 = hasher::digest_bytes(b"second");
    assert!(ws.objects().contains(&d2));

    let outcome = ws
        .pull("v2", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap();
    match outcome {
        PullOutcome::Completed(report) => {
            assert_eq!(report.downloaded, 0);
            assert!(report.eviction.removed.is_empty());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}
