//! Task metadata, routing, and worker feedback values.

use super::{ParseTaskFieldError, TaskId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Worker class a task should be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingTag {
    /// Breaks requirements down into tasks.
    Planner,
    /// Designs structure and interfaces.
    Architect,
    /// Writes implementation code.
    Coder,
    /// Reviews and investigates results.
    Reviewer,
    /// Runs commands and verification.
    Executor,
}

impl RoutingTag {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Architect => "architect",
            Self::Coder => "coder",
            Self::Reviewer => "reviewer",
            Self::Executor => "executor",
        }
    }
}

impl TryFrom<&str> for RoutingTag {
    type Error = ParseTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planner" => Ok(Self::Planner),
            "architect" => Ok(Self::Architect),
            "coder" => Ok(Self::Coder),
            "reviewer" => Ok(Self::Reviewer),
            "executor" => Ok(Self::Executor),
            _ => Err(ParseTaskFieldError::new("routing tag", value)),
        }
    }
}

impl fmt::Display for RoutingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to a task.
///
/// The typed fields drive scheduling decisions; `extra` carries anything
/// else a task source wants to keep alongside the task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    origin_ticket_id: Option<TicketId>,
    routing: Option<RoutingTag>,
    escalated: bool,
    follow_up_of: Option<TaskId>,
    extra: BTreeMap<String, Value>,
}

impl TaskMetadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ticket this task was raised from.
    #[must_use]
    pub fn with_origin_ticket(mut self, ticket_id: TicketId) -> Self {
        self.origin_ticket_id = Some(ticket_id);
        self
    }

    /// Sets the worker class that should handle the task.
    #[must_use]
    pub const fn with_routing(mut self, routing: RoutingTag) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Marks the task as escalated.
    #[must_use]
    pub const fn escalate(mut self) -> Self {
        self.escalated = true;
        self
    }

    /// Records the task this one follows up on.
    #[must_use]
    pub fn with_follow_up_of(mut self, task_id: TaskId) -> Self {
        self.follow_up_of = Some(task_id);
        self
    }

    /// Adds a free-form metadata entry.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns the originating ticket, if any.
    #[must_use]
    pub const fn origin_ticket_id(&self) -> Option<&TicketId> {
        self.origin_ticket_id.as_ref()
    }

    /// Returns the routing tag, if any.
    #[must_use]
    pub const fn routing(&self) -> Option<RoutingTag> {
        self.routing
    }

    /// Returns whether the task has been escalated.
    #[must_use]
    pub const fn escalated(&self) -> bool {
        self.escalated
    }

    /// Returns the task this one follows up on, if any.
    #[must_use]
    pub const fn follow_up_of(&self) -> Option<&TaskId> {
        self.follow_up_of.as_ref()
    }

    /// Returns the free-form metadata entries.
    #[must_use]
    pub const fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

/// Severity of a worker observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational note.
    #[default]
    Info,
    /// Something worth a second look.
    Warning,
    /// A problem that needs attention before the work can be trusted.
    Error,
}

/// Feedback a worker attached to a task while working on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    message: String,
    severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<RoutingTag>,
    recorded_at: DateTime<Utc>,
}

impl Observation {
    /// Creates an observation.
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity, recorded_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            severity,
            role: None,
            recorded_at,
        }
    }

    /// Attributes the observation to the worker class that made it.
    #[must_use]
    pub const fn with_role(mut self, role: Option<RoutingTag>) -> Self {
        self.role = role;
        self
    }

    /// Returns the observation text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the worker class that made the observation, if known.
    #[must_use]
    pub const fn role(&self) -> Option<RoutingTag> {
        self.role
    }

    /// Returns when the observation was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Outcome of an external verification run against a task's work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSignal {
    passed: bool,
    summary: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl VerificationSignal {
    /// Creates a verification signal.
    #[must_use]
    pub const fn new(passed: bool, summary: Option<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            passed,
            summary,
            recorded_at,
        }
    }

    /// Returns whether verification passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the verification summary, if any.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns when the signal was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
