//! Durable key-value port used by the persistence gateway.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for snapshot store operations.
pub type SnapshotStoreResult<T> = Result<T, SnapshotStoreError>;

/// Key-value storage for serialised queue snapshots.
///
/// Each queue writes a single record under its namespace key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads the record stored under `key`.
    ///
    /// Returns `None` when nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError`] when the backing store cannot be read.
    async fn read(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>>;

    /// Replaces the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError`] when the backing store rejects the
    /// write.
    async fn write(&self, key: &str, payload: Vec<u8>) -> SnapshotStoreResult<()>;
}

/// Errors returned by snapshot store implementations.
#[derive(Debug, Clone, Error)]
pub enum SnapshotStoreError {
    /// The key cannot be mapped onto the backing store.
    #[error("invalid snapshot key: {0}")]
    InvalidKey(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SnapshotStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
