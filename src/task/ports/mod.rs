//! Port contracts for the task queue.
//!
//! Ports define infrastructure-agnostic interfaces used by queue services.

pub mod notifier;
pub mod snapshot_store;

pub use notifier::QueueNotifier;
pub use snapshot_store::{SnapshotStore, SnapshotStoreError, SnapshotStoreResult};
