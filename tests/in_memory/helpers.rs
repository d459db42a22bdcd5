//! Shared test helpers for in-memory queue integration tests.

use atelier::config::QueueConfig;
use atelier::task::{
    adapters::memory::{CountingNotifier, InMemorySnapshotStore},
    domain::{NewTask, Priority, TaskId, TaskStatus},
    services::{LifecycleController, StatusReport},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

/// Controller type used across the in-memory integration tests.
pub type TestController = LifecycleController<InMemorySnapshotStore, CountingNotifier, DefaultClock>;

/// Provides a fresh snapshot store for each test.
#[fixture]
pub fn snapshots() -> Arc<InMemorySnapshotStore> {
    Arc::new(InMemorySnapshotStore::new())
}

/// Builds a controller over `snapshots` with the default configuration.
///
/// # Errors
///
/// Returns an error if the configuration is rejected.
pub fn controller_over(snapshots: &Arc<InMemorySnapshotStore>) -> eyre::Result<TestController> {
    controller_with(snapshots, QueueConfig::default())
}

/// Builds a controller over `snapshots` with `config`.
///
/// # Errors
///
/// Returns an error if the configuration is rejected.
pub fn controller_with(
    snapshots: &Arc<InMemorySnapshotStore>,
    config: QueueConfig,
) -> eyre::Result<TestController> {
    Ok(LifecycleController::new(
        Arc::clone(snapshots),
        Arc::new(CountingNotifier::new()),
        Arc::new(DefaultClock),
        config,
    )?)
}

/// Parses a task id.
///
/// # Errors
///
/// Returns an error if `value` is not a valid id.
pub fn task_id(value: &str) -> eyre::Result<TaskId> {
    Ok(TaskId::new(value)?)
}

/// Builds a task request with an explicit id.
///
/// # Errors
///
/// Returns an error if `id` is not a valid id.
pub fn draft(id: &str, priority: Priority) -> eyre::Result<NewTask> {
    Ok(NewTask::new(format!("Task {id}"), format!("Work for {id}"), priority).with_id(task_id(id)?))
}

/// Claims `id` and reports it finished with `outcome`.
///
/// # Errors
///
/// Returns an error if either report is rejected.
pub fn run_to(controller: &mut TestController, id: &str, outcome: TaskStatus) -> eyre::Result<()> {
    controller.report_status(StatusReport::new(task_id(id)?, TaskStatus::InProgress))?;
    controller.report_status(StatusReport::new(task_id(id)?, outcome))?;
    Ok(())
}
