//! Background persistence worker.
//!
//! The engine publishes every applied revision into a `watch` channel and
//! moves on. This task picks up the newest value, writes it on the blocking
//! pool, and records which revision is durable. Values published while a
//! save is in flight are coalesced; the last one always gets written.

use super::DocumentStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// A revision of the notepad as handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub revision: u64,
    pub content: Arc<str>,
}

/// Handle to the persistence task.
pub struct Persister {
    latest: watch::Sender<Snapshot>,
    saved: watch::Receiver<u64>,
    failures: Arc<AtomicU64>,
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Persister {
    /// Spawns the worker. `initial` is treated as already durable.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn DocumentStore>, initial: Snapshot) -> Self {
        let (latest, latest_rx) = watch::channel(initial.clone());
        let (saved_tx, saved) = watch::channel(initial.revision);
        let failures = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            store,
            latest_rx,
            saved_tx,
            Arc::clone(&failures),
            Arc::clone(&shutdown),
        ));

        Self {
            latest,
            saved,
            failures,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Queues `snapshot` for saving without waiting for I/O.
    ///
    /// Older revisions than the one already queued are ignored, so callers
    /// racing outside the engine lock cannot regress storage.
    pub fn publish(&self, snapshot: Snapshot) {
        self.latest.send_if_modified(|current| {
            if snapshot.revision > current.revision {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    /// Last revision known to be durable.
    pub fn saved_revision(&self) -> u64 {
        *self.saved.borrow()
    }

    /// Number of saves that failed since startup.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Waits until `revision` (or a later one) has been saved.
    ///
    /// Returns `false` if the worker stopped first.
    pub async fn wait_persisted(&self, revision: u64) -> bool {
        let mut saved = self.saved.clone();
        let reached = saved.wait_for(|saved| *saved >= revision).await.is_ok();
        reached
    }

    /// Flushes the newest value and stops the worker. Idempotent.
    pub async fn shutdown(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            self.shutdown.notify_one();
            if let Err(e) = task.await {
                tracing::error!(?e, "Persistence task panicked");
            }
        }
    }
}

async fn run(
    store: Arc<dyn DocumentStore>,
    mut latest: watch::Receiver<Snapshot>,
    saved: watch::Sender<u64>,
    failures: Arc<AtomicU64>,
    shutdown: Arc<Notify>,
) {
    loop {
        let stopping = tokio::select! {
            changed = latest.changed() => changed.is_err(),
            _ = shutdown.notified() => true,
        };

        let snapshot = latest.borrow_and_update().clone();
        if snapshot.revision > *saved.borrow() {
            save(&store, snapshot, &saved, &failures).await;
        }

        if stopping {
            break;
        }
    }

    tracing::debug!(revision = *saved.borrow(), "Persistence task stopped");
}

async fn save(
    store: &Arc<dyn DocumentStore>,
    snapshot: Snapshot,
    saved: &watch::Sender<u64>,
    failures: &AtomicU64,
) {
    let store = Arc::clone(store);
    let content = Arc::clone(&snapshot.content);

    match tokio::task::spawn_blocking(move || store.save(&content)).await {
        Ok(Ok(())) => {
            saved.send_replace(snapshot.revision);
        }
        Ok(Err(e)) => {
            failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                error = %e,
                revision = snapshot.revision,
                "Failed to save notepad, keeping in-memory state"
            );
        }
        Err(e) => {
            failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(?e, revision = snapshot.revision, "Save task panicked");
        }
    }
}
