//! Shared, serialised access to one lifecycle controller.

use super::lifecycle::LifecycleController;
use crate::task::ports::{QueueNotifier, SnapshotStore};
use mockable::Clock;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Cloneable handle through which callers reach a single queue.
///
/// Operations take the lock for their whole duration, so each one observes
/// and leaves a consistent store.
pub struct QueueHandle<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    inner: Arc<Mutex<LifecycleController<S, N, C>>>,
}

impl<S, N, C> QueueHandle<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    /// Wraps a controller for shared use.
    #[must_use]
    pub fn new(controller: LifecycleController<S, N, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Waits for exclusive access to the controller.
    pub async fn lock(&self) -> MutexGuard<'_, LifecycleController<S, N, C>> {
        self.inner.lock().await
    }
}

impl<S, N, C> Clone for QueueHandle<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
