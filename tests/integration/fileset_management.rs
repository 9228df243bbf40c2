//! Workspace lifecycle and remote fileset management

use super::test_utils::{write_file, Harness};
use setsync::error::SyncError;
use setsync::filter::FileSetFilter;
use setsync::workspace::{self, always_confirm, PushOptions, Workspace};
use std::sync::Arc;

#[tokio::test]
async fn test_list_latest_and_delete_filesets() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();

    write_file(&root, "shared.txt", "shared", 1_600_000_000);
    write_file(&root, "only-v1.txt", "v1 content", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    std::fs::remove_file(root.join("only-v1.txt")).unwrap();
    write_file(&root, "only-v2.txt", "v2 content", 1_600_000_000);
    ws.push("v2", &PushOptions::default()).await.unwrap();
    assert_eq!(h.blob_count("alpha").await, 3);

    let names: Vec<String> = ws.filesets().await.unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["v1".to_string(), "v2".to_string()]);
    assert_eq!(ws.latest_fileset().await.unwrap().as_deref(), Some("v2"));

    let report = ws.delete_fileset("v1").await.unwrap();
    assert_eq!(report.blobs_deleted, 1);
    assert_eq!(h.blob_count("alpha").await, 2);

    let names: Vec<String> = ws.filesets().await.unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["v2".to_string()]);

    let err = ws
        .pull("v1", &FileSetFilter::default(), &mut always_confirm)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::FilesetNotFound(_)));
}

#[tokio::test]
async fn test_init_rejects_existing_names_and_directories() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    write_file(ws.root(), "a.txt", "a", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    let err = Workspace::init(&h.dir("second"), "alpha", &h.config, Arc::clone(&h.store), false)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::WorkspaceExists(ref name) if name == "alpha"));

    let err = Workspace::init(ws.root(), "beta", &h.config, Arc::clone(&h.store), false)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::AlreadyInitialized(_)));

    let names = workspace::list_workspaces(&h.config, h.store.as_ref()).await.unwrap();
    assert_eq!(names, vec!["alpha".to_string()]);
}

#[tokio::test]
async fn test_open_discovers_workspace_from_subdirectory() {
    let h = Harness::new();
    let ws = h.init("alpha", "alpha").await;
    let nested = ws.root().join("deep/er");
    std::fs::create_dir_all(&nested).unwrap();

    let opened = Workspace::open(&nested, &h.config, Arc::clone(&h.store)).unwrap();
    assert_eq!(opened.name(), "alpha");
    assert_eq!(opened.root(), ws.root());

    let outside = h.dir("outside");
    let err = Workspace::open(&outside, &h.config, Arc::clone(&h.store)).err().unwrap();
    assert!(matches!(err, SyncError::NotAWorkspace(_)));
}

#[tokio::test]
async fn test_fileset_names_are_validated() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    for bad in ["", "_current", "a/b", ".hidden"] {
        let err = ws.push(bad, &PushOptions::default()).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidFilesetName(_)), "{:?} accepted", bad);
    }
}

#[tokio::test]
async fn test_clone_without_filesets_fails() {
    let h = Harness::new();
    h.init("alpha", "alpha").await;

    let err = Workspace::clone_remote(
        &h.dir("clones"),
        "alpha",
        None,
        &FileSetFilter::default(),
        &h.config,
        Arc::clone(&h.store),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, SyncError::NoFilesets(_)));
}

#[tokio::test]
async fn test_status_without_snapshot_reports_everything_added() {
    let h = Harness::new();
    let ws = h.init("alpha", "alpha").await;
    write_file(ws.root(), "a.txt", "a", 1_600_000_000);

    let status = ws.status().unwrap();
    assert_eq!(status.current, None);
    assert_eq!(status.added, vec!["a.txt".to_string()]);
    assert!(!status.is_clean());
}
