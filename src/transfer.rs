//! Bounded-concurrency transfer pool
//!
//! Runs a batch of uploads or downloads against an [`ObjectStore`] with at most
//! `concurrency` in flight. The first failure cancels every outstanding
//! transfer and becomes the batch result. Progress is logged periodically
//! from a shared byte counter.

use crate::error::TransferError;
use crate::remote::ObjectStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// One object movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferItem {
    Upload { source: PathBuf, key: String, size: u64 },
    Download { key: String, dest: PathBuf, size: u64 },
}

impl TransferItem {
    pub fn size(&self) -> u64 {
        match self {
            TransferItem::Upload { size, .. } | TransferItem::Download { size, .. } => *size,
        }
    }

    fn describe(&self) -> String {
        match self {
            TransferItem::Upload { key, .. } => format!("upload of {}", key),
            TransferItem::Download { key, .. } => format!("download of {}", key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub completed: usize,
    pub bytes: u64,
}

pub struct TransferPool {
    store: Arc<dyn ObjectStore>,
    concurrency: usize,
    transferred: Arc<AtomicU64>,
}

impl TransferPool {
    pub fn new(store: Arc<dyn ObjectStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
            transferred: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Bytes moved by this pool across every batch so far
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Run a batch to completion, or until the first failure.
    #[instrument(skip_all, fields(items = items.len(), concurrency = self.concurrency))]
    pub async fn run(&self, items: Vec<TransferItem>) -> Result<TransferReport, TransferError> {
        if items.is_empty() {
            return Ok(TransferReport::default());
        }

        let start = Instant::now();
        let expected: u64 = items.iter().map(TransferItem::size).sum();
        let baseline = self.transferred();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        // Set by the first failing transfer, before its permit is released.
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let cancelled = Arc::clone(&cancelled);
            let store = Arc::clone(&self.store);
            let counter = Arc::clone(&self.transferred);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| TransferError::Aborted("transfer pool closed".to_string()))?;
                if cancelled.load(Ordering::SeqCst) {
                    return Err(TransferError::Aborted(format!("{} not started", item.describe())));
                }
                match execute(store.as_ref(), &item).await {
                    Ok(bytes) => {
                        counter.fetch_add(bytes, Ordering::Relaxed);
                        Ok::<u64, TransferError>(bytes)
                    }
                    Err(e) => {
                        cancelled.store(true, Ordering::SeqCst);
                        Err(e)
                    }
                }
            });
        }

        let (stop_tx, progress) = self.spawn_progress(baseline, expected);

        let mut report = TransferReport::default();
        let mut failure: Option<TransferError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(bytes)) => {
                    report.completed += 1;
                    report.bytes += bytes;
                }
                Ok(Err(TransferError::Aborted(_))) if failure.is_some() => {}
                Ok(Err(e)) => {
                    let first = failure.is_none();
                    if first {
                        warn!(error = %e, "Transfer failed; cancelling remaining transfers");
                        tasks.abort_all();
                    }
                    if first || matches!(failure, Some(TransferError::Aborted(_))) {
                        failure = Some(e);
                    }
                }
                Err(join_err) if join_err.is_cancelled() => {}
                Err(join_err) => {
                    if failure.is_none() {
                        tasks.abort_all();
                        failure = Some(TransferError::Task(join_err.to_string()));
                    }
                }
            }
        }

        let _ = stop_tx.send(());
        let _ = progress.await;

        match failure {
            Some(e) => Err(e),
            None => {
                info!(
                    completed = report.completed,
                    bytes = report.bytes,
                    duration_ms = start.elapsed().as_millis(),
                    "Transfer batch completed"
                );
                Ok(report)
            }
        }
    }

    fn spawn_progress(&self, baseline: u64, expected: u64) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let counter = Arc::clone(&self.transferred);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
            ticker.tick().await;
            let mut last = 0;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let done = counter.load(Ordering::Relaxed).saturating_sub(baseline);
                        if done != last {
                            info!(bytes = done, total = expected, "Transfer progress");
                            last = done;
                        }
                    }
                }
            }
        });
        (stop_tx, handle)
    }
}

async fn execute(store: &dyn ObjectStore, item: &TransferItem) -> Result<u64, TransferError> {
    match item {
        TransferItem::Upload { source, key, .. } => {
            debug!(key = %key, source = %source.display(), "Uploading");
            store.put_file(key, source).await
        }
        TransferItem::Download { key, dest, .. } => {
            debug!(key = %key, dest = %dest.display(), "Downloading");
            store.get_file(key, dest).await
        }
    }
}
