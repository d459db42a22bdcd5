//! Observer port signalled after queue mutations.

/// Fire-and-forget observer of queue state changes.
///
/// Called after every mutation and exactly once after a snapshot load.
/// Implementations must not block.
pub trait QueueNotifier: Send + Sync {
    /// Signals that queue state changed.
    fn notify(&self);
}

impl<F> QueueNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self();
    }
}
