//! Application services for queue orchestration.

mod follow_up;
mod handle;
mod lifecycle;
mod persistence;
mod reports;
mod scheduler;
mod store;

pub use follow_up::{FollowUpError, compose_investigation, investigation_ticket};
pub use handle::QueueHandle;
pub use lifecycle::{LifecycleController, LifecycleError, LifecycleResult, LoadReport};
pub use persistence::{LoadOutcome, LoadedSnapshot, PersistenceGateway};
pub use reports::{
    AddTaskOutcome, QuestionOutcome, QuestionRequest, StatusChange, StatusReport,
    TestFailureReport, VerificationOutcome, VerificationReport,
};
pub use scheduler::{SchedulePreview, Scheduler, TaskFilter};
pub use store::{Sequence, TaskStore};
