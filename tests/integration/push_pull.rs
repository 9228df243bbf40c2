//! Push/pull round trips between workspaces sharing one remote

use super::test_utils::{mtime_secs, read_file, tree_listing, write_file, Harness};
use setsync::error::{SyncError, TransferError};
use setsync::filter::FileSetFilter;
use setsync::tree::hasher;
use setsync::workspace::{always_confirm, PendingChanges, PullOutcome, PushOptions, Workspace};
use std::sync::Arc;

#[tokio::test]
async fn test_push_uploads_each_content_once() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "a/x.txt", "same", 1_600_000_000);
    write_file(&root, "b/y.txt", "same", 1_600_000_000);
    write_file(&root, "c.txt", "other", 1_600_000_000);

    let report = ws.push("v1", &PushOptions::default()).await.unwrap();
    assert_eq!(report.digests, 2);
    assert_eq!(report.uploaded, 2);
    assert_eq!(report.already_present, 0);
    assert_eq!(report.bytes_uploaded, 9);
    assert_eq!(report.entries, 6);
    assert_eq!(report.size, 13);
    assert_eq!(h.blob_count("alpha").await, 2);

    let again = ws.push("v2", &PushOptions::default()).await.unwrap();
    assert_eq!(again.uploaded, 0);
    assert_eq!(again.already_present, 2);
    assert_eq!(h.blob_count("alpha").await, 2);
    assert_eq!(ws.current_fileset().unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_clone_reproduces_tree() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "docs/readme.md", "hello", 1_600_000_100);
    write_file(&root, "docs/copy.md", "hello", 1_600_000_200);
    write_file(&root, "empty.txt", "", 1_600_000_300);
    std::fs::create_dir_all(root.join("empty_dir")).unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink("docs/readme.md", root.join("link")).unwrap();

    ws.push("v1", &PushOptions::default()).await.unwrap();

    let parent = h.dir("clones");
    let (clone, outcome) = Workspace::clone_remote(
        &parent,
        "alpha",
        None,
        &FileSetFilter::default(),
        &h.config,
        Arc::clone(&h.store),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, PullOutcome::Completed(ref r) if r.downloaded == 1));
    assert_eq!(clone.current_fileset().unwrap().as_deref(), Some("v1"));

    let cloned = clone.root();
    assert_eq!(tree_listing(cloned), tree_listing(&root));
    assert_eq!(read_file(cloned, "docs/readme.md"), "hello");
    assert_eq!(read_file(cloned, "docs/copy.md"), "hello");
    assert_eq!(read_file(cloned, "empty.txt"), "");
    assert_eq!(mtime_secs(&cloned.join("docs/readme.md")), 1_600_000_100);
    assert_eq!(mtime_secs(&cloned.join("docs/copy.md")), 1_600_000_200);
    #[cfg(unix)]
    assert_eq!(
        std::fs::read_link(cloned.join("link")).unwrap(),
        std::path::PathBuf::from("docs/readme.md")
    );
    assert!(clone.status().unwrap().is_clean());
}

#[tokio::test]
async fn test_pull_switches_filesets_reusing_local_content() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();

    write_file(&root, "a.txt", "one", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    write_file(&root, "a.txt", "two", 1_600_000_500);
    write_file(&root, "b.txt", "bee", 1_600_000_500);
    ws.push("v2", &PushOptions::default()).await.unwrap();

    let mut never = |_: &PendingChanges| -> bool { panic!("no local changes expected") };
    let outcome = ws.pull("v1", &FileSetFilter::default(), &mut never).await.unwrap();
    let report = match outcome {
        PullOutcome::Completed(report) => report,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.preserved, 2);
    assert_eq!(read_file(&root, "a.txt"), "one");
    assert!(!root.join("b.txt").exists());

    let outcome = ws
        .pull("v2", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap();
    match outcome {
        PullOutcome::Completed(report) => assert_eq!(report.downloaded, 0),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(read_file(&root, "a.txt"), "two");
    assert_eq!(read_file(&root, "b.txt"), "bee");
    assert_eq!(ws.current_fileset().unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_pull_unknown_fileset_fails() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    write_file(ws.root(), "a.txt", "one", 1_600_000_000);

    let err = ws
        .pull("missing", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::FilesetNotFound(_)));
    assert_eq!(read_file(ws.root(), "a.txt"), "one");
}

#[tokio::test]
async fn test_failed_download_leaves_workspace_and_pointer_unchanged() {
    let h = Harness::new();
    let mut source = h.init("alpha", "alpha").await;
    let root = source.root().to_path_buf();
    write_file(&root, "a.txt", "one", 1_600_000_000);
    source.push("v1", &PushOptions::default()).await.unwrap();
    write_file(&root, "a.txt", "two", 1_600_000_500);
    write_file(&root, "b.txt", "bee", 1_600_000_500);
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

    let lost = hasher::digest_bytes(b"bee");
    h.remote("alpha").delete_blob(&lost).await.unwrap();

    let err = clone
        .pull("v2", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap_err();
    assert!(
        matches!(err, SyncError::TransferError(TransferError::NotFound(ref key)) if key.ends_with(lost.as_str())),
        "unexpected error {:?}",
        err
    );

    assert_eq!(read_file(clone.root(), "a.txt"), "one");
    assert!(!clone.root().join("b.txt").exists());
    assert_eq!(clone.current_fileset().unwrap().as_deref(), Some("v1"));

    // Blobs fetched before the failure are discarded along with any partials.
    let leftovers: Vec<_> = std::fs::read_dir(clone.objects().dir())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "cache not cleaned: {:?}", leftovers);
}
