//! Request and outcome types for lifecycle operations.

use crate::task::domain::{Task, TaskId, TaskStatus, TicketId};

/// Result of offering a task to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTaskOutcome {
    /// The task was stored.
    Accepted {
        /// Identifier of the stored task.
        id: TaskId,
        /// Task removed to stay within capacity, if any.
        evicted: Option<TaskId>,
    },
    /// An open task already carries the same ticket id; nothing changed.
    DuplicateSuppressed {
        /// The open task holding the ticket.
        existing: TaskId,
    },
}

impl AddTaskOutcome {
    /// Returns the stored task or the open task that suppressed the add.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::Accepted { id, .. } => id,
            Self::DuplicateSuppressed { existing } => existing,
        }
    }

    /// Returns `true` when a new task was stored.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the evicted task, if any.
    #[must_use]
    pub const fn evicted(&self) -> Option<&TaskId> {
        match self {
            Self::Accepted { evicted, .. } => evicted.as_ref(),
            Self::DuplicateSuppressed { .. } => None,
        }
    }
}

/// Verification outcome attached to a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Whether verification passed.
    pub passed: bool,
    /// Optional verification summary.
    pub summary: Option<String>,
}

/// Worker report asking for a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub(crate) task_id: TaskId,
    pub(crate) status: TaskStatus,
    pub(crate) summary: Option<String>,
    pub(crate) blocked_by: Vec<TaskId>,
    pub(crate) verification: Option<VerificationReport>,
}

impl StatusReport {
    /// Creates a report moving `task_id` to `status`.
    #[must_use]
    pub const fn new(task_id: TaskId, status: TaskStatus) -> Self {
        Self {
            task_id,
            status,
            summary: None,
            blocked_by: Vec::new(),
            verification: None,
        }
    }

    /// Attaches a worker summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Names the holds for a `BLOCKED` report.
    #[must_use]
    pub fn with_blocked_by(mut self, holds: impl IntoIterator<Item = TaskId>) -> Self {
        self.blocked_by = holds.into_iter().collect();
        self
    }

    /// Attaches a verification outcome.
    #[must_use]
    pub fn with_verification(mut self, passed: bool, summary: Option<String>) -> Self {
        self.verification = Some(VerificationReport { passed, summary });
        self
    }

    /// Returns the reported task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the requested status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }
}

/// Effects of an accepted status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// The task after the change.
    pub task: Task,
    /// Status held before the change.
    pub previous: TaskStatus,
    /// Investigation task raised by the change, if any.
    pub follow_up: Option<TaskId>,
    /// Tasks whose hold on the reported task was released.
    pub released: Vec<TaskId>,
}

/// Effects of a recorded verification signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// The task after recording the signal.
    pub task: Task,
    /// Investigation task raised by a failing signal on a finished task.
    pub follow_up: Option<TaskId>,
}

/// Ticket raised for a failing test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailureReport {
    pub(crate) test_name: String,
    pub(crate) message: String,
    pub(crate) task_id: Option<TaskId>,
    pub(crate) ticket_id: Option<TicketId>,
}

impl TestFailureReport {
    /// Creates a report for `test_name` failing with `message`.
    #[must_use]
    pub fn new(test_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            message: message.into(),
            task_id: None,
            ticket_id: None,
        }
    }

    /// Records the task whose work surfaced the failure.
    #[must_use]
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Uses an explicit ticket id instead of one derived from the test name.
    #[must_use]
    pub fn with_ticket_id(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }
}

/// Clarifying question raised by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub(crate) question: String,
    pub(crate) task_id: Option<TaskId>,
    pub(crate) ticket_id: Option<TicketId>,
    pub(crate) blocking: bool,
}

impl QuestionRequest {
    /// Creates a non-blocking question.
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            task_id: None,
            ticket_id: None,
            blocking: false,
        }
    }

    /// Records the task the question is about.
    #[must_use]
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Deduplicates the question against an external ticket.
    #[must_use]
    pub fn with_ticket_id(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    /// Holds the asking task until the question is answered.
    #[must_use]
    pub const fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }
}

/// Effects of a raised question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    /// The clarification task, or the open one that suppressed it.
    pub question: AddTaskOutcome,
    /// The asking task, when it was moved to `BLOCKED`.
    pub blocked_task: Option<TaskId>,
}
