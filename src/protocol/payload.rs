//! Wire projections returned in success payloads.
//!
//! Context blobs stay in memory and never cross the protocol.

use crate::task::domain::{
    Observation, Priority, RoutingTag, Severity, Task, TaskId, TaskMetadata, TaskStatus,
    TicketId, VerificationSignal,
};
use crate::task::services::AddTaskOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata as seen by workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataView {
    /// Ticket that raised the task.
    pub origin_ticket_id: Option<TicketId>,
    /// Worker class the task is routed to.
    pub routing: Option<RoutingTag>,
    /// Whether the task was escalated.
    pub escalated: bool,
    /// Task this one investigates.
    pub follow_up_of: Option<TaskId>,
    /// Free-form attributes.
    pub extra: BTreeMap<String, Value>,
}

impl From<&TaskMetadata> for MetadataView {
    fn from(metadata: &TaskMetadata) -> Self {
        Self {
            origin_ticket_id: metadata.origin_ticket_id().cloned(),
            routing: metadata.routing(),
            escalated: metadata.escalated(),
            follow_up_of: metadata.follow_up_of().cloned(),
            extra: metadata.extra().clone(),
        }
    }
}

/// Observation as seen by workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationView {
    /// Observation text.
    pub message: String,
    /// Observation severity.
    pub severity: Severity,
    /// Worker class that made it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoutingTag>,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl From<&Observation> for ObservationView {
    fn from(observation: &Observation) -> Self {
        Self {
            message: observation.message().to_owned(),
            severity: observation.severity(),
            role: observation.role(),
            recorded_at: observation.recorded_at(),
        }
    }
}

/// Verification signal as seen by workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    /// Whether verification passed.
    pub passed: bool,
    /// Verification summary.
    pub summary: Option<String>,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl From<&VerificationSignal> for VerificationView {
    fn from(signal: &VerificationSignal) -> Self {
        Self {
            passed: signal.passed(),
            summary: signal.summary().map(ToOwned::to_owned),
            recorded_at: signal.recorded_at(),
        }
    }
}

/// Task as seen by workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task id.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Tasks that must complete first.
    pub dependencies: Vec<TaskId>,
    /// Holds in place.
    pub blocked_by: Vec<TaskId>,
    /// Metadata.
    pub metadata: MetadataView,
    /// Feedback log.
    pub observations: Vec<ObservationView>,
    /// Latest verification signal.
    pub verification: Option<VerificationView>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().clone(),
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            priority: task.priority(),
            status: task.status(),
            dependencies: task.dependencies().to_vec(),
            blocked_by: task.blocked_by().to_vec(),
            metadata: MetadataView::from(task.metadata()),
            observations: task.observations().iter().map(ObservationView::from).collect(),
            verification: task.verification().map(VerificationView::from),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Result of `getNextTask`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextTaskPayload {
    /// The selected task, or `null` when nothing is eligible.
    pub task: Option<TaskView>,
    /// Tasks queued behind it.
    pub upcoming: Vec<TaskView>,
}

/// Result of `reportTaskStatus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    /// The task after the change.
    pub task: TaskView,
    /// Status before the change.
    pub previous_status: TaskStatus,
    /// Investigation task raised by the change.
    pub follow_up_task_id: Option<TaskId>,
    /// Tasks whose hold on this task was released.
    pub released_task_ids: Vec<TaskId>,
}

/// Result of `reportObservation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationPayload {
    /// The task after recording.
    pub task: TaskView,
}

/// Result of `reportVerificationResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    /// The task after recording.
    pub task: TaskView,
    /// Investigation task raised by the signal.
    pub follow_up_task_id: Option<TaskId>,
}

/// Result of ticket-raising calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    /// The new task, or the open task that suppressed it.
    pub task_id: TaskId,
    /// `false` when an open duplicate already existed.
    pub created: bool,
    /// Task evicted to make room.
    pub evicted_task_id: Option<TaskId>,
    /// Asking task moved to `BLOCKED`, for blocking questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_task_id: Option<TaskId>,
}

impl From<&AddTaskOutcome> for TicketPayload {
    fn from(outcome: &AddTaskOutcome) -> Self {
        Self {
            task_id: outcome.task_id().clone(),
            created: outcome.is_accepted(),
            evicted_task_id: outcome.evicted().cloned(),
            blocked_task_id: None,
        }
    }
}
