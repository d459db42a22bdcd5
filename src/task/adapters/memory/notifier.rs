//! Notifier adapters that need no external observer.

use crate::task::ports::QueueNotifier;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Notifier that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl QueueNotifier for NoopNotifier {
    fn notify(&self) {}
}

/// Notifier that counts signals.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl CountingNotifier {
    /// Creates a notifier with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times [`QueueNotifier::notify`] was called.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl QueueNotifier for CountingNotifier {
    fn notify(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
