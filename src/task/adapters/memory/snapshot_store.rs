//! In-memory snapshot store for tests and ephemeral queues.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::ports::{SnapshotStore, SnapshotStoreError, SnapshotStoreResult};

/// Thread-safe in-memory snapshot store.
///
/// Counts successful writes and can be told to fail reads or writes, which
/// makes debounce and failure-absorption behaviour observable.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    state: Arc<RwLock<InMemorySnapshotState>>,
}

#[derive(Debug, Default)]
struct InMemorySnapshotState {
    records: HashMap<String, Vec<u8>>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl InMemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes under `key` without counting a write.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] if the state lock is
    /// poisoned.
    pub fn seed(&self, key: impl Into<String>, payload: Vec<u8>) -> SnapshotStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.records.insert(key.into(), payload);
        Ok(())
    }

    /// Returns the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] if the state lock is
    /// poisoned.
    pub fn payload(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.records.get(key).cloned())
    }

    /// Returns the number of successful writes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] if the state lock is
    /// poisoned.
    pub fn write_count(&self) -> SnapshotStoreResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.writes)
    }

    /// Makes subsequent reads fail or succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] if the state lock is
    /// poisoned.
    pub fn set_fail_reads(&self, fail: bool) -> SnapshotStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.fail_reads = fail;
        Ok(())
    }

    /// Makes subsequent writes fail or succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] if the state lock is
    /// poisoned.
    pub fn set_fail_writes(&self, fail: bool) -> SnapshotStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.fail_writes = fail;
        Ok(())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> SnapshotStoreError {
    SnapshotStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn read(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>> {
        let state = self.state.read().map_err(poisoned)?;
        if state.fail_reads {
            return Err(SnapshotStoreError::persistence(std::io::Error::other(
                "snapshot read failure injected",
            )));
        }
        Ok(state.records.get(key).cloned())
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> SnapshotStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.fail_writes {
            return Err(SnapshotStoreError::persistence(std::io::Error::other(
                "snapshot write failure injected",
            )));
        }
        state.records.insert(key.to_owned(), payload);
        state.writes += 1;
        Ok(())
    }
}
