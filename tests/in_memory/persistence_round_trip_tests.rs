//! Flushing a queue and reloading it through a shared snapshot store.

use super::helpers::{controller_over, controller_with, draft, run_to, snapshots, task_id};
use atelier::config::QueueConfig;
use atelier::task::{
    adapters::memory::InMemorySnapshotStore,
    domain::{Priority, TaskStatus},
    services::{LoadOutcome, StatusReport, TaskFilter},
};
use eyre::{OptionExt, ensure};
use rstest::rstest;
use serde_json::json;
use std::{sync::Arc, time::Duration};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reload_restores_open_work(snapshots: Arc<InMemorySnapshotStore>) -> eyre::Result<()> {
    let mut writer = controller_over(&snapshots)?;
    writer.add_task(draft("done", Priority::P1)?)?;
    writer.add_task(draft("active", Priority::P2)?.with_context(json!({"scratch": true})))?;
    writer.add_task(draft("queued", Priority::P3)?.with_dependencies([task_id("active")?]))?;
    run_to(&mut writer, "done", TaskStatus::Completed)?;
    writer.report_status(StatusReport::new(task_id("active")?, TaskStatus::InProgress))?;
    ensure!(writer.flush().await, "flush should be accepted");

    let mut reader = controller_over(&snapshots)?;
    let report = reader.load().await;

    ensure!(report.outcome == LoadOutcome::Restored);
    ensure!(report.restored == 2, "restored {}", report.restored);
    ensure!(report.dropped_terminal == 1);
    let active = reader
        .task(&task_id("active")?)
        .ok_or_eyre("active task missing")?;
    ensure!(active.status() == TaskStatus::InProgress);
    ensure!(active.context().is_none(), "context must not be persisted");
    ensure!(reader.next_task(&TaskFilter::new()).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reload_without_snapshot_starts_empty(
    snapshots: Arc<InMemorySnapshotStore>,
) -> eyre::Result<()> {
    let mut reader = controller_over(&snapshots)?;
    let report = reader.load().await;

    ensure!(report.outcome == LoadOutcome::Missing);
    ensure!(report.restored == 0);
    ensure!(reader.store().is_empty());
    Ok(())
}

#[rstest]
#[case::within_retention(Duration::from_secs(3600))]
#[case::past_retention(Duration::ZERO)]
#[tokio::test(flavor = "multi_thread")]
async fn failed_dependency_still_blocks_after_reload(
    snapshots: Arc<InMemorySnapshotStore>,
    #[case] retention: Duration,
) -> eyre::Result<()> {
    let config = QueueConfig::default()
        .with_investigate_failures(false)
        .with_terminal_retention(retention);
    let mut writer = controller_with(&snapshots, config.clone())?;
    writer.add_task(draft("dep", Priority::P1)?)?;
    writer.add_task(draft("child", Priority::P2)?.with_dependencies([task_id("dep")?]))?;
    run_to(&mut writer, "dep", TaskStatus::Failed)?;
    ensure!(writer.next_task(&TaskFilter::new()).is_none());
    ensure!(writer.flush().await, "flush should be accepted");

    let mut reader = controller_with(&snapshots, config)?;
    let report = reader.load().await;

    ensure!(report.outcome == LoadOutcome::Restored);
    ensure!(report.restored == 1, "restored {}", report.restored);
    ensure!(report.dropped_terminal == 1, "dropped {}", report.dropped_terminal);
    let child = reader
        .task(&task_id("child")?)
        .ok_or_eyre("child task missing")?;
    ensure!(child.status() == TaskStatus::Pending, "child is {:?}", child.status());
    ensure!(reader.next_task(&TaskFilter::new()).is_none());
    Ok(())
}
