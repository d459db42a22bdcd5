//! Debounced, bounded snapshot writer and loader.
//!
//! Persistence is best-effort: failures are logged and absorbed, and the
//! queue keeps running from memory.

use crate::config::QueueConfig;
use crate::task::domain::{QueueSnapshot, SnapshotPolicy, SnapshotTask, Task, TaskId, TaskStatus};
use crate::task::ports::SnapshotStore;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a snapshot load ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid snapshot was read.
    Restored,
    /// Nothing had been saved yet.
    #[default]
    Missing,
    /// The stored bytes were unreadable, of an unknown version, or failed
    /// their checksum.
    Corrupted,
    /// The store could not be read.
    Unavailable,
}

/// Tasks recovered from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSnapshot {
    /// Non-terminal tasks in their saved order.
    pub tasks: Vec<Task>,
    /// Number of terminal entries that were dropped.
    pub dropped_terminal: usize,
    /// Ids of dropped `FAILED` entries, which still gate their dependents.
    pub failed_ids: Vec<TaskId>,
    /// How the load ended.
    pub outcome: LoadOutcome,
}

/// Serialises writes and discards any payload older than the last one
/// written.
struct SnapshotWriter<S> {
    store: Arc<S>,
    namespace: String,
    last_generation: Mutex<u64>,
}

impl<S> SnapshotWriter<S>
where
    S: SnapshotStore,
{
    async fn write(&self, generation: u64, payload: Vec<u8>) -> bool {
        let mut last = self.last_generation.lock().await;
        if generation <= *last {
            debug!(namespace = %self.namespace, generation, "superseded snapshot skipped");
            return false;
        }
        *last = generation;

        match self.store.write(&self.namespace, payload).await {
            Ok(()) => {
                debug!(namespace = %self.namespace, generation, "queue snapshot written");
                true
            }
            Err(err) => {
                warn!(
                    namespace = %self.namespace,
                    error = %err,
                    "queue snapshot write failed, continuing in memory"
                );
                false
            }
        }
    }
}

/// Debounced snapshot gateway owned by one queue.
///
/// At most one scheduled write is live; scheduling again cancels it and
/// starts a fresh window, so a burst of mutations produces one write.
pub struct PersistenceGateway<S>
where
    S: SnapshotStore + 'static,
{
    writer: Arc<SnapshotWriter<S>>,
    debounce: Duration,
    policy: SnapshotPolicy,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl<S> PersistenceGateway<S>
where
    S: SnapshotStore + 'static,
{
    /// Creates a gateway writing to `store` under the configured namespace.
    #[must_use]
    pub fn new(store: Arc<S>, config: &QueueConfig) -> Self {
        let retention = TimeDelta::from_std(config.terminal_retention()).unwrap_or(TimeDelta::MAX);
        Self {
            writer: Arc::new(SnapshotWriter {
                store,
                namespace: config.namespace.clone(),
                last_generation: Mutex::new(0),
            }),
            debounce: config.debounce(),
            policy: SnapshotPolicy {
                limit: config.snapshot_limit,
                retention,
            },
            generation: 0,
            pending: None,
        }
    }

    /// Returns the namespace key snapshots are stored under.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.writer.namespace
    }

    /// Returns `true` while a scheduled write has not fired yet.
    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Schedules a snapshot of `tasks` after the debounce window.
    ///
    /// Any write still waiting for its window is cancelled. Outside a Tokio
    /// runtime the save is skipped with a warning.
    pub fn schedule_save<'a>(&mut self, tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) {
        let Some(payload) = self.encode(tasks, now) else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(namespace = %self.namespace(), "no async runtime, snapshot save skipped");
            return;
        };

        self.cancel_pending();
        let generation = self.next_generation();
        let writer = Arc::clone(&self.writer);
        let delay = self.debounce;
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later reschedule cannot abort a write mid-flight.
            drop(tokio::spawn(async move {
                writer.write(generation, payload).await;
            }));
        });
        self.pending = Some(timer);
    }

    /// Cancels any scheduled write and saves `tasks` immediately.
    ///
    /// Returns `true` when the store accepted the write.
    pub async fn flush<'a>(
        &mut self,
        tasks: impl IntoIterator<Item = &'a Task>,
        now: DateTime<Utc>,
    ) -> bool {
        self.cancel_pending();
        let Some(payload) = self.encode(tasks, now) else {
            return false;
        };
        let generation = self.next_generation();
        self.writer.write(generation, payload).await
    }

    /// Reads the stored snapshot, keeping only non-terminal tasks.
    ///
    /// Missing, unreadable, or corrupted snapshots yield an empty result.
    pub async fn load(&self) -> LoadedSnapshot {
        let namespace = self.namespace();
        let bytes = match self.writer.store.read(namespace).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(namespace, "no queue snapshot found, starting empty");
                return LoadedSnapshot::default();
            }
            Err(err) => {
                warn!(namespace, error = %err, "queue snapshot unreadable, starting empty");
                return LoadedSnapshot {
                    outcome: LoadOutcome::Unavailable,
                    ..LoadedSnapshot::default()
                };
            }
        };

        let snapshot = match QueueSnapshot::decode(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(namespace, error = %err, "queue snapshot corrupted, starting empty");
                return LoadedSnapshot {
                    outcome: LoadOutcome::Corrupted,
                    ..LoadedSnapshot::default()
                };
            }
        };

        let (terminal, active): (Vec<_>, Vec<_>) = snapshot
            .into_tasks()
            .into_iter()
            .partition(|entry| entry.status.is_terminal());
        let failed_ids: Vec<TaskId> = terminal
            .iter()
            .filter(|entry| entry.status == TaskStatus::Failed)
            .map(|entry| entry.id.clone())
            .collect();
        let tasks: Vec<Task> = active.into_iter().map(SnapshotTask::into_task).collect();
        info!(
            namespace,
            restored = tasks.len(),
            dropped_terminal = terminal.len(),
            "queue snapshot loaded"
        );
        LoadedSnapshot {
            tasks,
            dropped_terminal: terminal.len(),
            failed_ids,
            outcome: LoadOutcome::Restored,
        }
    }

    fn encode<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Option<Vec<u8>> {
        match QueueSnapshot::capture(tasks, self.policy, now).and_then(|snapshot| snapshot.encode()) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(namespace = %self.namespace(), error = %err, "queue snapshot encoding failed");
                None
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    const fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
