//! Authoritative in-memory task collection.

use crate::task::domain::{Task, TaskId, TaskStatus, TicketId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Monotonic insertion order of a task within a store.
pub type Sequence = u64;

/// Bounded, insertion-ordered task collection.
///
/// Readers get shared accessors; mutation is reserved for the lifecycle
/// controller.
#[derive(Debug, Clone)]
pub struct TaskStore {
    capacity: usize,
    next_sequence: Sequence,
    entries: BTreeMap<Sequence, Task>,
    index: HashMap<TaskId, Sequence>,
    failed_elsewhere: HashSet<TaskId>,
}

impl TaskStore {
    /// Creates an empty store holding at most `capacity` tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_sequence: 0,
            entries: BTreeMap::new(),
            index: HashMap::new(),
            failed_elsewhere: HashSet::new(),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of tasks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no tasks are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when a task with `id` is held.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.index.get(id).and_then(|sequence| self.entries.get(sequence))
    }

    /// Iterates tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.entries.values()
    }

    /// Iterates tasks with their insertion sequence, in insertion order.
    pub fn sequenced(&self) -> impl Iterator<Item = (Sequence, &Task)> {
        self.entries.iter().map(|(sequence, task)| (*sequence, task))
    }

    /// Returns the non-terminal task raised from `ticket_id`, if any.
    #[must_use]
    pub fn open_task_for_ticket(&self, ticket_id: &TicketId) -> Option<&Task> {
        self.tasks().find(|task| {
            !task.status().is_terminal() && task.metadata().origin_ticket_id() == Some(ticket_id)
        })
    }

    /// Returns the task currently `IN_PROGRESS`, if any.
    #[must_use]
    pub fn active_task(&self) -> Option<&Task> {
        self.tasks()
            .find(|task| task.status() == TaskStatus::InProgress)
    }

    /// Returns `true` when every dependency of `task` is completed or absent.
    ///
    /// Ids missing from the store are treated as satisfied outside the queue,
    /// unless they name a task known to have failed before it left the store.
    #[must_use]
    pub fn dependencies_satisfied(&self, task: &Task) -> bool {
        task.dependencies().iter().all(|dependency| match self.get(dependency) {
            Some(found) => found.status() == TaskStatus::Completed,
            None => !self.failed_elsewhere.contains(dependency),
        })
    }

    /// Returns `true` when `id` names a failed task no longer held.
    #[must_use]
    pub fn is_known_failure(&self, id: &TaskId) -> bool {
        self.failed_elsewhere.contains(id)
    }

    /// Returns the first held task reachable from `dependencies` that
    /// depends back on `id`, if adding such a task would close a cycle.
    #[must_use]
    pub fn cycle_through(&self, id: &TaskId, dependencies: &[TaskId]) -> Option<TaskId> {
        let mut stack: Vec<&TaskId> = dependencies.iter().collect();
        let mut visited: Vec<&TaskId> = Vec::new();
        while let Some(current) = stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            let Some(task) = self.get(current) else {
                continue;
            };
            if task.dependencies().contains(id) {
                return Some(current.clone());
            }
            stack.extend(task.dependencies());
        }
        None
    }

    pub(crate) fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        let sequence = self.index.get(id)?;
        self.entries.get_mut(sequence)
    }

    pub(crate) fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.entries.values_mut()
    }

    /// Inserts a task, evicting one first when at capacity.
    ///
    /// Returns the evicted task.
    pub(crate) fn insert(&mut self, task: Task) -> Option<Task> {
        let evicted = if self.entries.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.failed_elsewhere.remove(task.id());
        self.index.insert(task.id().clone(), sequence);
        self.entries.insert(sequence, task);
        evicted
    }

    /// Records ids of failed tasks that are not held, so dependents stay
    /// gated on them.
    pub(crate) fn remember_failures(&mut self, ids: impl IntoIterator<Item = TaskId>) {
        self.failed_elsewhere.extend(ids);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.failed_elsewhere.clear();
    }

    fn evict_one(&mut self) -> Option<Task> {
        let victim = self
            .entries
            .iter()
            .find(|(_, task)| task.status().is_terminal())
            .or_else(|| self.entries.iter().next())
            .map(|(sequence, _)| *sequence)?;
        let task = self.entries.remove(&victim)?;
        self.index.remove(task.id());
        if task.status() == TaskStatus::Failed {
            self.failed_elsewhere.insert(task.id().clone());
        }
        Some(task)
    }
}
