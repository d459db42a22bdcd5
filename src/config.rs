//! Queue configuration.
//!
//! Loading configuration from files or the environment is left to the host
//! process; this module only defines the values and their validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Tunables for a task queue instance.
///
/// # Examples
///
/// ```
/// use atelier::config::QueueConfig;
///
/// let config = QueueConfig::default().with_capacity(10);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.debounce().as_millis(), 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum number of tasks held in memory.
    pub capacity: usize,
    /// Coalescing window for snapshot writes, in milliseconds.
    pub debounce_ms: u64,
    /// Maximum number of tasks in a persisted snapshot.
    pub snapshot_limit: usize,
    /// How long terminal tasks stay in snapshots after their last update,
    /// in seconds.
    pub terminal_retention_secs: u64,
    /// Key under which the snapshot is stored.
    pub namespace: String,
    /// Default number of upcoming tasks returned alongside the next task.
    pub preview_limit: usize,
    /// Whether a failed task always spawns an investigation task, even
    /// without a failing verification signal.
    pub investigate_failures: bool,
}

impl QueueConfig {
    /// Upper bound for [`QueueConfig::preview_limit`] and per-call preview
    /// requests.
    pub const MAX_PREVIEW: usize = 10;

    /// Sets the in-memory capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the snapshot size limit.
    #[must_use]
    pub const fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// Sets the terminal task retention window.
    #[must_use]
    pub const fn with_terminal_retention(mut self, window: Duration) -> Self {
        self.terminal_retention_secs = window.as_secs();
        self
    }

    /// Sets the snapshot namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets whether failures always spawn investigation tasks.
    #[must_use]
    pub const fn with_investigate_failures(mut self, enabled: bool) -> Self {
        self.investigate_failures = enabled;
        self
    }

    /// Returns the debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Returns the terminal task retention window.
    #[must_use]
    pub const fn terminal_retention(&self) -> Duration {
        Duration::from_secs(self.terminal_retention_secs)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.snapshot_limit == 0 {
            return Err(ConfigError::ZeroSnapshotLimit);
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.preview_limit > Self::MAX_PREVIEW {
            return Err(ConfigError::PreviewTooLarge {
                requested: self.preview_limit,
                max: Self::MAX_PREVIEW,
            });
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            debounce_ms: 200,
            snapshot_limit: 50,
            terminal_retention_secs: 3600,
            namespace: "atelier.task_queue".to_owned(),
            preview_limit: 3,
            investigate_failures: true,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The queue must hold at least one task.
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    /// Snapshots must hold at least one task.
    #[error("snapshot limit must be at least 1")]
    ZeroSnapshotLimit,

    /// The snapshot namespace is blank.
    #[error("snapshot namespace must not be empty")]
    EmptyNamespace,

    /// The preview limit exceeds the supported maximum.
    #[error("preview limit {requested} exceeds maximum {max}")]
    PreviewTooLarge {
        /// Configured value.
        requested: usize,
        /// Supported maximum.
        max: usize,
    },
}
