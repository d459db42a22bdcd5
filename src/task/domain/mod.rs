//! Domain model for the task queue.
//!
//! Tasks, their lifecycle table, metadata, aggregate counts, and the
//! persisted snapshot format. Nothing here touches infrastructure.

mod error;
mod ids;
mod metadata;
mod snapshot;
mod state;
mod status;
mod task;

pub use error::{ParseTaskFieldError, TaskDomainError};
pub use ids::{TaskId, TicketId};
pub use metadata::{Observation, RoutingTag, Severity, TaskMetadata, VerificationSignal};
pub use snapshot::{
    QueueSnapshot, SNAPSHOT_VERSION, SnapshotCodecError, SnapshotMetadata, SnapshotPolicy,
    SnapshotTask,
};
pub use state::{Priority, TaskStatus};
pub use status::{PriorityCounts, QueueStatus, StatusCounts};
pub use task::{NewTask, PersistedTask, Task};
