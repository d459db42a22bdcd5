//! In-memory adapters.

mod notifier;
mod snapshot_store;

pub use notifier::{CountingNotifier, NoopNotifier};
pub use snapshot_store::InMemorySnapshotStore;
