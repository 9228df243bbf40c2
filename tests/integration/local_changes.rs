//! Protection of local modifications during pull

use super::test_utils::{read_file, write_file, Harness};
use setsync::filter::FileSetFilter;
use setsync::workspace::{PendingChanges, PullOutcome, PushOptions};

#[tokio::test]
async fn test_declined_pull_leaves_workspace_untouched() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "a.txt", "original", 1_600_000_000);
    write_file(&root, "keep.txt", "keep", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    write_file(&root, "a.txt", "edited", 1_600_000_100);
    write_file(&root, "new.txt", "brand new", 1_600_000_100);

    let status = ws.status().unwrap();
    assert_eq!(status.added, vec!["new.txt".to_string()]);
    assert_eq!(status.updated, vec!["a.txt".to_string()]);

    let mut seen: Vec<PendingChanges> = Vec::new();
    let mut decline = |changes: &PendingChanges| {
        seen.push(changes.clone());
        false
    };
    let outcome = ws.pull("v1", &FileSetFilter::default(), &mut decline).await.unwrap();
    match outcome {
        PullOutcome::Declined(changes) => {
            assert_eq!(changes.added, vec!["new.txt".to_string()]);
            assert_eq!(changes.updated, vec!["a.txt".to_string()]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(seen.len(), 1);
    assert_eq!(read_file(&root, "a.txt"), "edited");
    assert_eq!(read_file(&root, "new.txt"), "brand new");
    assert!(ws.objects().total_size().unwrap() == 0);
}

#[tokio::test]
async fn test_confirmed_pull_discards_changes() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "a.txt", "original", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    write_file(&root, "a.txt", "edited", 1_600_000_100);
    write_file(&root, "new.txt", "brand new", 1_600_000_100);

    let mut calls = 0;
    let mut accept = |_: &PendingChanges| {
        calls += 1;
        true
    };
    let outcome = ws.pull("v1", &FileSetFilter::default(), &mut accept).await.unwrap();
    assert!(matches!(outcome, PullOutcome::Completed(ref r) if r.downloaded == 1 && r.preserved == 0));
    assert_eq!(calls, 1);
    assert_eq!(read_file(&root, "a.txt"), "original");
    assert!(!root.join("new.txt").exists());
    assert!(ws.status().unwrap().is_clean());
}

#[tokio::test]
async fn test_changes_outside_filter_do_not_prompt() {
    let h = Harness::new();
    let mut ws = h.init("alpha", "alpha").await;
    let root = ws.root().to_path_buf();
    write_file(&root, "data/a.bin", "aaaa", 1_600_000_000);
    write_file(&root, "notes.txt", "notes", 1_600_000_000);
    ws.push("v1", &PushOptions::default()).await.unwrap();

    write_file(&root, "notes.txt", "scribbles", 1_600_000_100);

    let filter = FileSetFilter::parse_list("data/*").unwrap();
    let mut never = |_: &PendingChanges| -> bool { panic!("change outside the filter reported") };
    let outcome = ws.pull("v1", &filter, &mut never).await.unwrap();
    assert!(matches!(outcome, PullOutcome::Completed(_)));
    assert_eq!(read_file(&root, "data/a.bin"), "aaaa");
    assert!(!root.join("notes.txt").exists());
}
