//! Lifecycle controller: the single writer of task state.
//!
//! Every mutation runs the readiness pass, schedules a debounced snapshot,
//! and notifies observers.

use super::follow_up::compose_investigation;
use super::persistence::{LoadOutcome, PersistenceGateway};
use super::reports::{
    AddTaskOutcome, QuestionOutcome, QuestionRequest, StatusChange, StatusReport,
    TestFailureReport, VerificationOutcome,
};
use super::scheduler::{SchedulePreview, Scheduler, TaskFilter};
use super::store::TaskStore;
use crate::config::{ConfigError, QueueConfig};
use crate::task::domain::{
    NewTask, Observation, Priority, QueueStatus, RoutingTag, Severity, Task, TaskDomainError,
    TaskId, TaskMetadata, TaskStatus, TicketId, VerificationSignal,
};
use crate::task::ports::{QueueNotifier, SnapshotStore};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Longest question excerpt used in a clarification task title.
const QUESTION_TITLE_CHARS: usize = 80;

/// Service-level errors for lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// No task has the given id.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A task with the supplied id already exists.
    #[error("task identifier already in use: {0}")]
    DuplicateTaskId(TaskId),

    /// Adding the task would make the dependency graph cyclic.
    #[error("task {task_id} would close a dependency cycle through {through}")]
    CyclicDependency {
        /// Task being added.
        task_id: TaskId,
        /// Existing task that depends back on it.
        through: TaskId,
    },

    /// Only `IN_PROGRESS` tasks can complete or fail.
    #[error("task {task_id} is {status}, only IN_PROGRESS tasks can finish")]
    NotInProgress {
        /// Reported task.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
    },

    /// Another task is already claimed.
    #[error("task {active} is already in progress")]
    ActiveTaskExists {
        /// The claimed task.
        active: TaskId,
    },

    /// A task cannot become ready before its dependencies complete.
    #[error("task {0} still has unfinished dependencies")]
    DependenciesUnmet(TaskId),

    /// A `BLOCKED` report named no holds.
    #[error("blocking task {0} requires at least one hold")]
    MissingHolds(TaskId),

    /// A task named itself as its own hold.
    #[error("task {0} cannot hold itself")]
    SelfHold(TaskId),

    /// A required text field was blank.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Summary of a startup load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Tasks now held in memory.
    pub restored: usize,
    /// Terminal entries left behind.
    pub dropped_terminal: usize,
    /// How reading the snapshot ended.
    pub outcome: LoadOutcome,
}

/// Owns the task store and applies every state change.
pub struct LifecycleController<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    store: TaskStore,
    gateway: PersistenceGateway<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: QueueConfig,
}

impl<S, N, C> LifecycleController<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a controller with an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(
        snapshots: Arc<S>,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: QueueConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store: TaskStore::new(config.capacity),
            gateway: PersistenceGateway::new(snapshots, &config),
            notifier,
            clock,
            config,
        })
    }

    /// Returns the task store for read access.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Returns the persistence gateway.
    #[must_use]
    pub const fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    /// Returns the task a worker should run next, without claiming it.
    #[must_use]
    pub fn next_task(&self, filter: &TaskFilter) -> Option<&Task> {
        Scheduler::next_task(&self.store, filter)
    }

    /// Returns the next task and up to `limit` tasks behind it.
    #[must_use]
    pub fn preview(&self, filter: &TaskFilter, limit: usize) -> SchedulePreview<'_> {
        Scheduler::preview(&self.store, filter, limit)
    }

    /// Returns counts by priority and status, the active task, and totals.
    #[must_use]
    pub fn queue_status(&self) -> QueueStatus {
        let ready = Scheduler::compute_ready_set(&self.store).len();
        QueueStatus::tally(self.store.tasks(), ready)
    }

    /// Returns every error-severity observation, oldest task first.
    #[must_use]
    pub fn blocking_observations(&self) -> Vec<(&Task, &Observation)> {
        self.store
            .tasks()
            .flat_map(|task| {
                task.observations()
                    .iter()
                    .filter(|observation| observation.severity() == Severity::Error)
                    .map(move |observation| (task, observation))
            })
            .collect()
    }

    /// Offers a task to the queue.
    ///
    /// A task whose ticket matches an open task is suppressed rather than
    /// rejected. At capacity the oldest terminal task is evicted, or the
    /// oldest task when none has finished.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Domain`] for blank fields,
    /// [`LifecycleError::DuplicateTaskId`] for a reused explicit id, and
    /// [`LifecycleError::CyclicDependency`] when the dependencies loop back.
    pub fn add_task(&mut self, request: NewTask) -> LifecycleResult<AddTaskOutcome> {
        let outcome = self.insert_task(request)?;
        if outcome.is_accepted() {
            self.commit();
        }
        Ok(outcome)
    }

    /// Applies a worker status report.
    ///
    /// Completing a task releases holds other tasks placed on it. A failed
    /// task, or a completed one with a failing verification signal, raises
    /// an investigation task.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for unknown ids, an invalid-state
    /// error for reports the lifecycle does not allow, and a validation error
    /// for malformed `BLOCKED` reports.
    pub fn report_status(&mut self, report: StatusReport) -> LifecycleResult<StatusChange> {
        let StatusReport {
            task_id,
            status,
            summary,
            blocked_by,
            verification,
        } = report;

        let (previous, dependencies_met) = {
            let current = self
                .store
                .get(&task_id)
                .ok_or_else(|| LifecycleError::NotFound(task_id.clone()))?;
            (current.status(), self.store.dependencies_satisfied(current))
        };
        let active = self.store.active_task().map(|task| task.id().clone());
        guard_report(&ReportGuard {
            task_id: &task_id,
            previous,
            next: status,
            dependencies_met,
            active: active.as_ref(),
            holds: &blocked_by,
        })?;

        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .get_mut(&task_id)
            .ok_or_else(|| LifecycleError::NotFound(task_id.clone()))?;
        task.transition_to(status, &*clock)?;
        match status {
            TaskStatus::Blocked => task.add_holds(blocked_by, &*clock),
            TaskStatus::Ready => task.clear_holds(&*clock),
            _ => {}
        }
        if let Some(outcome) = verification {
            let signal = VerificationSignal::new(outcome.passed, outcome.summary, clock.utc());
            task.record_verification(signal, &*clock);
        }
        if let Some(text) = summary.as_deref() {
            task.record_observation(Observation::new(text, Severity::Info, clock.utc()), &*clock);
        }
        let updated = task.clone();
        info!(task = %task_id, from = %previous, to = %status, "task status changed");

        let released = if status == TaskStatus::Completed {
            self.release_holds_on(&task_id)
        } else {
            Vec::new()
        };
        let follow_up = if self.should_investigate(&updated) {
            self.spawn_investigation(&updated, summary.as_deref())
        } else {
            None
        };

        self.refresh_readiness();
        self.commit();
        Ok(StatusChange {
            task: self.store.get(&task_id).cloned().unwrap_or(updated),
            previous,
            follow_up,
            released,
        })
    }

    /// Appends a worker observation to a task's feedback log.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::EmptyField`] for a blank message and
    /// [`LifecycleError::NotFound`] for an unknown task.
    pub fn record_observation(
        &mut self,
        task_id: &TaskId,
        message: &str,
        severity: Severity,
        role: Option<RoutingTag>,
    ) -> LifecycleResult<Task> {
        let text = message.trim();
        if text.is_empty() {
            return Err(LifecycleError::EmptyField("observation message"));
        }
        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .get_mut(task_id)
            .ok_or_else(|| LifecycleError::NotFound(task_id.clone()))?;
        let observation = Observation::new(text, severity, clock.utc()).with_role(role);
        task.record_observation(observation, &*clock);
        let updated = task.clone();
        debug!(task = %task_id, ?severity, ?role, "observation recorded");
        self.commit();
        Ok(updated)
    }

    /// Records a verification signal against a task.
    ///
    /// A failing signal on a task that already finished raises an
    /// investigation immediately; on an unfinished task it is kept and
    /// acted on when the task finishes.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for an unknown task.
    pub fn record_verification(
        &mut self,
        task_id: &TaskId,
        passed: bool,
        summary: Option<String>,
    ) -> LifecycleResult<VerificationOutcome> {
        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .get_mut(task_id)
            .ok_or_else(|| LifecycleError::NotFound(task_id.clone()))?;
        task.record_verification(VerificationSignal::new(passed, summary, clock.utc()), &*clock);
        let updated = task.clone();

        let follow_up = if !passed && updated.status().is_terminal() {
            self.spawn_investigation(&updated, None)
        } else {
            None
        };
        self.refresh_readiness();
        self.commit();
        Ok(VerificationOutcome {
            task: self.store.get(task_id).cloned().unwrap_or(updated),
            follow_up,
        })
    }

    /// Raises a `P1` coder ticket for a failing test.
    ///
    /// Without an explicit ticket id the test name is the deduplication key,
    /// so repeated reports of the same open failure are suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::EmptyField`] for a blank test name,
    /// [`LifecycleError::NotFound`] when the referenced task is unknown, and
    /// domain errors for a blank message.
    pub fn raise_test_failure(
        &mut self,
        report: TestFailureReport,
    ) -> LifecycleResult<AddTaskOutcome> {
        let test_name = report.test_name.trim();
        if test_name.is_empty() {
            return Err(LifecycleError::EmptyField("test name"));
        }
        self.ensure_known(report.task_id.as_ref())?;

        let ticket = report
            .ticket_id
            .map_or_else(|| TicketId::new(format!("test:{test_name}")), Ok)?;
        let mut metadata = TaskMetadata::new()
            .with_origin_ticket(ticket)
            .with_routing(RoutingTag::Coder)
            .with_extra("test_name", Value::String(test_name.to_owned()));
        if let Some(reporter) = &report.task_id {
            metadata = metadata.with_extra("reported_by", Value::String(reporter.to_string()));
        }

        let request = NewTask::new(
            format!("Fix failing test: {test_name}"),
            report.message,
            Priority::P1,
        )
        .with_metadata(metadata);
        self.add_task(request)
    }

    /// Raises an escalated `P2` planner ticket for a clarifying question.
    ///
    /// A blocking question asked from the `IN_PROGRESS` task moves that task
    /// to `BLOCKED`, held by the question task until it completes.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::EmptyField`] for a blank question and
    /// [`LifecycleError::NotFound`] when the asking task is unknown.
    pub fn ask_question(&mut self, request: QuestionRequest) -> LifecycleResult<QuestionOutcome> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(LifecycleError::EmptyField("question"));
        }
        self.ensure_known(request.task_id.as_ref())?;

        let mut metadata = TaskMetadata::new()
            .with_routing(RoutingTag::Planner)
            .escalate();
        if let Some(ticket) = request.ticket_id {
            metadata = metadata.with_origin_ticket(ticket);
        }
        if let Some(asker) = &request.task_id {
            metadata = metadata.with_extra("asked_by", Value::String(asker.to_string()));
        }
        let excerpt: String = question
            .lines()
            .next()
            .unwrap_or(question)
            .chars()
            .take(QUESTION_TITLE_CHARS)
            .collect();
        let new_task = NewTask::new(format!("Clarify: {excerpt}"), question, Priority::P2)
            .with_metadata(metadata);

        let outcome = self.insert_task(new_task)?;
        let blocked_task = match request.task_id {
            Some(asker) if request.blocking => self.hold_for_question(&asker, outcome.task_id()),
            _ => None,
        };
        if outcome.is_accepted() || blocked_task.is_some() {
            self.refresh_readiness();
            self.commit();
        }
        Ok(QuestionOutcome {
            question: outcome,
            blocked_task,
        })
    }

    /// Releases an external hold from every task carrying it.
    ///
    /// Returns the tasks that were released.
    pub fn release_hold(&mut self, hold: &TaskId) -> Vec<TaskId> {
        let released = self.release_holds_on(hold);
        if !released.is_empty() {
            self.refresh_readiness();
            self.commit();
        }
        released
    }

    /// Rebuilds the store from the persisted snapshot.
    ///
    /// Observers are notified exactly once, whatever the snapshot held.
    pub async fn load(&mut self) -> LoadReport {
        let loaded = self.gateway.load().await;
        self.store.clear();
        self.store.remember_failures(loaded.failed_ids);
        for task in loaded.tasks {
            if self.store.contains(task.id()) {
                warn!(task = %task.id(), "duplicate task in snapshot skipped");
                continue;
            }
            if let Some(evicted) = self.store.insert(task) {
                warn!(task = %evicted.id(), "snapshot exceeds capacity, task evicted");
            }
        }
        self.refresh_readiness();
        self.notifier.notify();
        LoadReport {
            restored: self.store.len(),
            dropped_terminal: loaded.dropped_terminal,
            outcome: loaded.outcome,
        }
    }

    /// Writes a snapshot now instead of waiting for the debounce window.
    ///
    /// Returns `true` when the store accepted the write.
    pub async fn flush(&mut self) -> bool {
        let now = self.clock.utc();
        self.gateway.flush(self.store.tasks(), now).await
    }

    fn insert_task(&mut self, request: NewTask) -> LifecycleResult<AddTaskOutcome> {
        let task = Task::create(request, &*self.clock)?;
        if let Some(existing) = task
            .metadata()
            .origin_ticket_id()
            .and_then(|ticket| self.store.open_task_for_ticket(ticket))
        {
            debug!(
                ticket = ?task.metadata().origin_ticket_id(),
                existing = %existing.id(),
                "duplicate ticket suppressed"
            );
            return Ok(AddTaskOutcome::DuplicateSuppressed {
                existing: existing.id().clone(),
            });
        }
        if self.store.contains(task.id()) {
            return Err(LifecycleError::DuplicateTaskId(task.id().clone()));
        }
        if let Some(through) = self.store.cycle_through(task.id(), task.dependencies()) {
            return Err(LifecycleError::CyclicDependency {
                task_id: task.id().clone(),
                through,
            });
        }

        let id = task.id().clone();
        let capacity = self.store.capacity();
        let evicted = self.store.insert(task).map(|victim| {
            warn!(
                evicted = %victim.id(),
                status = %victim.status(),
                capacity,
                "queue at capacity, task evicted"
            );
            victim.id().clone()
        });
        self.refresh_readiness();
        debug!(task = %id, "task accepted");
        Ok(AddTaskOutcome::Accepted { id, evicted })
    }

    fn ensure_known(&self, task_id: Option<&TaskId>) -> LifecycleResult<()> {
        match task_id {
            Some(id) if !self.store.contains(id) => Err(LifecycleError::NotFound(id.clone())),
            _ => Ok(()),
        }
    }

    fn should_investigate(&self, task: &Task) -> bool {
        match task.status() {
            TaskStatus::Completed => task.has_failing_verification(),
            TaskStatus::Failed => self.config.investigate_failures || task.has_failing_verification(),
            _ => false,
        }
    }

    fn spawn_investigation(&mut self, original: &Task, summary: Option<&str>) -> Option<TaskId> {
        let request = match compose_investigation(original, summary) {
            Ok(request) => request,
            Err(err) => {
                warn!(task = %original.id(), error = %err, "investigation task not raised");
                return None;
            }
        };
        match self.insert_task(request) {
            Ok(outcome) => {
                info!(
                    task = %original.id(),
                    investigation = %outcome.task_id(),
                    duplicate = !outcome.is_accepted(),
                    "investigation task raised"
                );
                Some(outcome.task_id().clone())
            }
            Err(err) => {
                warn!(task = %original.id(), error = %err, "investigation task not raised");
                None
            }
        }
    }

    fn hold_for_question(&mut self, asker: &TaskId, question: &TaskId) -> Option<TaskId> {
        let clock = Arc::clone(&self.clock);
        let task = self.store.get_mut(asker)?;
        if task.status() != TaskStatus::InProgress {
            debug!(task = %asker, status = %task.status(), "blocking question left task running");
            return None;
        }
        task.transition_to(TaskStatus::Blocked, &*clock).ok()?;
        task.add_holds([question.clone()], &*clock);
        info!(task = %asker, question = %question, "task blocked on question");
        Some(asker.clone())
    }

    fn release_holds_on(&mut self, hold: &TaskId) -> Vec<TaskId> {
        let clock = Arc::clone(&self.clock);
        self.store
            .tasks_mut()
            .filter_map(|task| {
                task.release_hold(hold, &*clock)
                    .then(|| task.id().clone())
            })
            .collect()
    }

    fn refresh_readiness(&mut self) {
        let changes: Vec<(TaskId, TaskStatus)> = self
            .store
            .tasks()
            .filter_map(|task| {
                readiness_target(&self.store, task).map(|next| (task.id().clone(), next))
            })
            .collect();

        let clock = Arc::clone(&self.clock);
        for (id, next) in changes {
            let Some(task) = self.store.get_mut(&id) else {
                continue;
            };
            match task.transition_to(next, &*clock) {
                Ok(()) => debug!(task = %id, to = %next, "readiness updated"),
                Err(err) => warn!(task = %id, error = %err, "readiness update rejected"),
            }
        }
    }

    fn commit(&mut self) {
        let now = self.clock.utc();
        self.gateway.schedule_save(self.store.tasks(), now);
        self.notifier.notify();
    }
}

/// Inputs checked before a status report touches the store.
struct ReportGuard<'a> {
    task_id: &'a TaskId,
    previous: TaskStatus,
    next: TaskStatus,
    dependencies_met: bool,
    active: Option<&'a TaskId>,
    holds: &'a [TaskId],
}

fn guard_report(guard: &ReportGuard<'_>) -> LifecycleResult<()> {
    let task_id = guard.task_id;
    match guard.next {
        TaskStatus::InProgress => match guard.active {
            Some(active) if active != task_id => Err(LifecycleError::ActiveTaskExists {
                active: active.clone(),
            }),
            _ => Ok(()),
        },
        TaskStatus::Completed | TaskStatus::Failed if guard.previous != TaskStatus::InProgress => {
            Err(LifecycleError::NotInProgress {
                task_id: task_id.clone(),
                status: guard.previous,
            })
        }
        TaskStatus::Blocked if guard.holds.is_empty() => {
            Err(LifecycleError::MissingHolds(task_id.clone()))
        }
        TaskStatus::Blocked if guard.holds.contains(task_id) => {
            Err(LifecycleError::SelfHold(task_id.clone()))
        }
        TaskStatus::Ready if !guard.dependencies_met => {
            Err(LifecycleError::DependenciesUnmet(task_id.clone()))
        }
        _ => Ok(()),
    }
}

fn readiness_target(store: &TaskStore, task: &Task) -> Option<TaskStatus> {
    match task.status() {
        TaskStatus::Pending if task.is_held() => Some(TaskStatus::Blocked),
        TaskStatus::Pending | TaskStatus::Blocked
            if !task.is_held() && store.dependencies_satisfied(task) =>
        {
            Some(TaskStatus::Ready)
        }
        _ => None,
    }
}
