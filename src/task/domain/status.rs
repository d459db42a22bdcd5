//! Aggregate queue counts.

use super::{Priority, Task, TaskId, TaskStatus};
use serde::Serialize;

/// Task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    /// `P1` tasks.
    #[serde(rename = "P1")]
    pub p1: usize,
    /// `P2` tasks.
    #[serde(rename = "P2")]
    pub p2: usize,
    /// `P3` tasks.
    #[serde(rename = "P3")]
    pub p3: usize,
}

impl PriorityCounts {
    /// Returns the count for a priority.
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::P1 => self.p1,
            Priority::P2 => self.p2,
            Priority::P3 => self.p3,
        }
    }

    const fn slot(&mut self, priority: Priority) -> &mut usize {
        match priority {
            Priority::P1 => &mut self.p1,
            Priority::P2 => &mut self.p2,
            Priority::P3 => &mut self.p3,
        }
    }
}

/// Task counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusCounts {
    /// `PENDING` tasks.
    pub pending: usize,
    /// `READY` tasks.
    pub ready: usize,
    /// `IN_PROGRESS` tasks.
    pub in_progress: usize,
    /// `COMPLETED` tasks.
    pub completed: usize,
    /// `BLOCKED` tasks.
    pub blocked: usize,
    /// `FAILED` tasks.
    pub failed: usize,
}

impl StatusCounts {
    /// Returns the count for a status.
    #[must_use]
    pub const fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::Ready => self.ready,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
            TaskStatus::Blocked => self.blocked,
            TaskStatus::Failed => self.failed,
        }
    }

    const fn slot(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::Ready => &mut self.ready,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Blocked => &mut self.blocked,
            TaskStatus::Failed => &mut self.failed,
        }
    }
}

/// Point-in-time summary of the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Counts per priority.
    pub by_priority: PriorityCounts,
    /// Counts per status.
    pub by_status: StatusCounts,
    /// The task currently `IN_PROGRESS`, if any.
    pub active_task_id: Option<TaskId>,
    /// Number of tasks eligible for selection.
    pub ready: usize,
    /// Total number of tasks held in memory.
    pub total: usize,
    /// Completed tasks as a whole percentage of `total`, `0` when empty.
    pub progress_percent: usize,
}

impl QueueStatus {
    /// Tallies the given tasks. `ready` is supplied by the scheduler.
    #[must_use]
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>, ready: usize) -> Self {
        let mut status = Self {
            ready,
            ..Self::default()
        };
        for task in tasks {
            *status.by_priority.slot(task.priority()) += 1;
            *status.by_status.slot(task.status()) += 1;
            if task.status() == TaskStatus::InProgress && status.active_task_id.is_none() {
                status.active_task_id = Some(task.id().clone());
            }
            status.total += 1;
        }
        status.progress_percent = status
            .by_status
            .completed
            .saturating_mul(100)
            .checked_div(status.total)
            .unwrap_or(0);
        status
    }
}
