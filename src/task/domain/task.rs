//! Task aggregate root and creation request.

use super::{
    Observation, Priority, TaskDomainError, TaskId, TaskMetadata, TaskStatus, VerificationSignal,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to create a task.
///
/// Identifiers are generated unless the task source supplies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    id: Option<TaskId>,
    title: String,
    description: String,
    priority: Priority,
    dependencies: Vec<TaskId>,
    blocked_by: Vec<TaskId>,
    metadata: TaskMetadata,
    context: Option<Value>,
}

impl NewTask {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            priority,
            dependencies: Vec::new(),
            blocked_by: Vec::new(),
            metadata: TaskMetadata::default(),
            context: None,
        }
    }

    /// Uses a caller-supplied identifier instead of a generated one.
    #[must_use]
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the tasks that must complete first.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Sets the holds that keep the task ineligible.
    #[must_use]
    pub fn with_blocked_by(mut self, blocked_by: impl IntoIterator<Item = TaskId>) -> Self {
        self.blocked_by = blocked_by.into_iter().collect();
        self
    }

    /// Sets task metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: TaskMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a context payload that stays in memory only.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the caller-supplied identifier, if any.
    #[must_use]
    pub const fn id(&self) -> Option<&TaskId> {
        self.id.as_ref()
    }

    /// Returns the requested metadata.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Returns the requested dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTask {
    /// Persisted identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted dependencies.
    pub dependencies: Vec<TaskId>,
    /// Persisted holds.
    pub blocked_by: Vec<TaskId>,
    /// Persisted metadata subset.
    pub metadata: TaskMetadata,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    priority: Priority,
    status: TaskStatus,
    dependencies: Vec<TaskId>,
    blocked_by: Vec<TaskId>,
    metadata: TaskMetadata,
    context: Option<Value>,
    observations: Vec<Observation>,
    verification: Option<VerificationSignal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a `PENDING` task from a creation request.
    ///
    /// Duplicate dependency and hold ids are collapsed, keeping first
    /// occurrence order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::EmptyDescription`] for blank text, and
    /// [`TaskDomainError::SelfDependency`] when the task depends on itself.
    pub fn create(request: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let description = request.description.trim();
        if description.is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }

        let id = request.id.unwrap_or_else(TaskId::generate);
        if request.dependencies.contains(&id) {
            return Err(TaskDomainError::SelfDependency(id));
        }

        let timestamp = clock.utc();
        Ok(Self {
            title: title.to_owned(),
            description: description.to_owned(),
            priority: request.priority,
            status: TaskStatus::Pending,
            dependencies: dedup_ids(request.dependencies),
            blocked_by: dedup_ids(request.blocked_by),
            metadata: request.metadata,
            context: request.context,
            observations: Vec::new(),
            verification: None,
            created_at: timestamp,
            updated_at: timestamp,
            id,
        })
    }

    /// Reconstructs a task from a persisted snapshot entry.
    #[must_use]
    pub fn from_persisted(data: PersistedTask) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            dependencies: dedup_ids(data.dependencies),
            blocked_by: dedup_ids(data.blocked_by),
            metadata: data.metadata,
            context: None,
            observations: Vec::new(),
            verification: None,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the ids that must complete before this task is eligible.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Returns the holds currently preventing eligibility.
    #[must_use]
    pub fn blocked_by(&self) -> &[TaskId] {
        &self.blocked_by
    }

    /// Returns `true` when at least one hold is in place.
    #[must_use]
    pub fn is_held(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Returns task metadata.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Returns the in-memory context payload, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Returns worker observations in recording order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Returns the latest verification signal, if any.
    #[must_use]
    pub const fn verification(&self) -> Option<&VerificationSignal> {
        self.verification.as_ref()
    }

    /// Returns `true` when the latest verification signal failed.
    #[must_use]
    pub fn has_failing_verification(&self) -> bool {
        self.verification.as_ref().is_some_and(|signal| !signal.passed())
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the task to `next` when the lifecycle table allows it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] for any edge not in
    /// the table. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        next: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch(clock);
        Ok(())
    }

    /// Adds holds, ignoring ids already present.
    pub fn add_holds(&mut self, holds: impl IntoIterator<Item = TaskId>, clock: &impl Clock) {
        for hold in holds {
            if !self.blocked_by.contains(&hold) {
                self.blocked_by.push(hold);
            }
        }
        self.touch(clock);
    }

    /// Removes a single hold. Returns `true` when it was present.
    pub fn release_hold(&mut self, hold: &TaskId, clock: &impl Clock) -> bool {
        let before = self.blocked_by.len();
        self.blocked_by.retain(|existing| existing != hold);
        let released = self.blocked_by.len() != before;
        if released {
            self.touch(clock);
        }
        released
    }

    /// Removes every hold.
    pub fn clear_holds(&mut self, clock: &impl Clock) {
        self.blocked_by.clear();
        self.touch(clock);
    }

    /// Appends a worker observation.
    pub fn record_observation(&mut self, observation: Observation, clock: &impl Clock) {
        self.observations.push(observation);
        self.touch(clock);
    }

    /// Replaces the latest verification signal.
    pub fn record_verification(&mut self, signal: VerificationSignal, clock: &impl Clock) {
        self.verification = Some(signal);
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn dedup_ids(ids: Vec<TaskId>) -> Vec<TaskId> {
    let mut unique: Vec<TaskId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
