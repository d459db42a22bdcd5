//! Ready-set computation and next-task selection.
//!
//! The scheduler never mutates the store. Selecting a task is a peek:
//! claiming happens only when a worker reports the task `IN_PROGRESS`.

use super::store::{Sequence, TaskStore};
use crate::task::domain::{Priority, RoutingTag, Task, TaskStatus};

/// Optional narrowing applied on top of the ready set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    statuses: Vec<TaskStatus>,
    priorities: Vec<Priority>,
    routing: Option<RoutingTag>,
}

impl TaskFilter {
    /// Creates a filter that matches every ready task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts matches to the given statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts matches to the given priorities.
    #[must_use]
    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities = priorities.into_iter().collect();
        self
    }

    /// Restricts matches to one worker class.
    #[must_use]
    pub const fn with_routing(mut self, routing: RoutingTag) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Returns `true` when `task` passes every configured restriction.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&task.status());
        let priority_ok = self.priorities.is_empty() || self.priorities.contains(&task.priority());
        let routing_ok = self
            .routing
            .is_none_or(|routing| task.metadata().routing() == Some(routing));
        status_ok && priority_ok && routing_ok
    }
}

/// The selected task plus the tasks queued behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulePreview<'a> {
    /// Highest-ranked eligible task.
    pub next: Option<&'a Task>,
    /// Following eligible tasks, in selection order.
    pub upcoming: Vec<&'a Task>,
}

/// Stateless query layer over a [`TaskStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Returns `true` when `task` may be selected.
    ///
    /// Eligible tasks are `READY`, `PENDING`, or `BLOCKED`, carry no holds,
    /// and have every dependency completed.
    #[must_use]
    pub fn is_eligible(store: &TaskStore, task: &Task) -> bool {
        matches!(
            task.status(),
            TaskStatus::Ready | TaskStatus::Pending | TaskStatus::Blocked
        ) && !task.is_held()
            && store.dependencies_satisfied(task)
    }

    /// Returns every eligible task in selection order.
    ///
    /// Ordering is by priority, then creation time, then insertion order.
    #[must_use]
    pub fn compute_ready_set(store: &TaskStore) -> Vec<&Task> {
        Self::ranked(store, &TaskFilter::default())
    }

    /// Returns the task a worker should run next without claiming it.
    #[must_use]
    pub fn next_task<'a>(store: &'a TaskStore, filter: &TaskFilter) -> Option<&'a Task> {
        Self::ranked(store, filter).into_iter().next()
    }

    /// Returns the next task and up to `limit` tasks queued behind it.
    #[must_use]
    pub fn preview<'a>(store: &'a TaskStore, filter: &TaskFilter, limit: usize) -> SchedulePreview<'a> {
        let mut ranked = Self::ranked(store, filter).into_iter();
        let next = ranked.next();
        let upcoming = ranked.take(limit).collect();
        SchedulePreview { next, upcoming }
    }

    fn ranked<'a>(store: &'a TaskStore, filter: &TaskFilter) -> Vec<&'a Task> {
        let mut eligible: Vec<(Sequence, &Task)> = store
            .sequenced()
            .filter(|(_, task)| Self::is_eligible(store, task) && filter.matches(task))
            .collect();
        eligible.sort_by_key(|(sequence, task)| (task.priority(), task.created_at(), *sequence));
        eligible.into_iter().map(|(_, task)| task).collect()
    }
}
