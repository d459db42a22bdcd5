//! Unit tests for debounced snapshot persistence and startup loading.

use super::fixtures::{Harness, claim, draft, harness_with, task_id};
use crate::config::QueueConfig;
use crate::task::adapters::memory::CountingNotifier;
use crate::task::domain::{Priority, Task, TaskStatus};
use crate::task::ports::{SnapshotStore, SnapshotStoreError, SnapshotStoreResult};
use crate::task::services::{LifecycleController, LoadOutcome, StatusReport};
use async_trait::async_trait;
use eyre::ensure;
use mockable::DefaultClock;
use mockall::mock;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Store {}

    #[async_trait]
    impl SnapshotStore for Store {
        async fn read(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>>;
        async fn write(&self, key: &str, payload: Vec<u8>) -> SnapshotStoreResult<()>;
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(QueueConfig::default())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn burst_of_mutations_produces_one_write(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        snapshots,
        ..
    } = harness;
    for index in 0..5 {
        controller.add_task(draft(&format!("burst-{index}"), Priority::P2))?;
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    ensure!(snapshots.write_count()? == 0);

    tokio::time::sleep(Duration::from_millis(250)).await;
    ensure!(snapshots.write_count()? == 1);
    ensure!(snapshots.payload(controller.gateway().namespace())?.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn flush_writes_now_and_cancels_the_pending_save(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        snapshots,
        ..
    } = harness;
    controller.add_task(draft("flushed", Priority::P1))?;
    ensure!(controller.gateway().has_pending_save());

    ensure!(controller.flush().await);
    ensure!(snapshots.write_count()? == 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    ensure!(snapshots.write_count()? == 1);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn write_failures_are_absorbed() -> eyre::Result<()> {
    let mut store = MockStore::new();
    store
        .expect_write()
        .returning(|_, _| Err(SnapshotStoreError::persistence(std::io::Error::other("disk full"))));
    let mut controller = LifecycleController::new(
        Arc::new(store),
        Arc::new(CountingNotifier::new()),
        Arc::new(DefaultClock),
        QueueConfig::default(),
    )?;

    controller.add_task(draft("survivor", Priority::P2))?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    ensure!(!controller.flush().await);
    ensure!(controller.task(&task_id("survivor")).is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn corrupted_snapshot_loads_as_empty_queue(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        snapshots,
        notifier,
    } = harness;
    snapshots.seed(controller.gateway().namespace(), b"{ not a snapshot".to_vec())?;

    let report = controller.load().await;

    ensure!(report.outcome == LoadOutcome::Corrupted);
    ensure!(report.restored == 0);
    ensure!(controller.store().is_empty());
    ensure!(notifier.count() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreadable_store_loads_as_empty_queue(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        snapshots,
        notifier,
    } = harness;
    snapshots.set_fail_reads(true)?;

    let report = controller.load().await;

    ensure!(report.outcome == LoadOutcome::Unavailable);
    ensure!(controller.store().is_empty());
    ensure!(notifier.count() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_snapshot_loads_as_empty_queue(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        notifier,
        ..
    } = harness;

    let report = controller.load().await;

    ensure!(report.outcome == LoadOutcome::Missing);
    ensure!(notifier.count() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_restores_open_tasks_and_drops_finished_ones(harness: Harness) -> eyre::Result<()> {
    let Harness {
        mut controller,
        snapshots,
        ..
    } = harness;
    claim(&mut controller, "finished");
    controller.report_status(StatusReport::new(task_id("finished"), TaskStatus::Completed))?;
    claim(&mut controller, "running");
    controller.add_task(draft("queued", Priority::P3))?;
    ensure!(controller.flush().await);

    let Harness {
        controller: mut restarted,
        snapshots: fresh,
        notifier,
    } = harness_with(QueueConfig::default());
    let namespace = restarted.gateway().namespace().to_owned();
    let Some(payload) = snapshots.payload(&namespace)? else {
        eyre::bail!("flush left no snapshot behind");
    };
    fresh.seed(namespace, payload)?;

    let report = restarted.load().await;

    ensure!(report.outcome == LoadOutcome::Restored);
    ensure!(report.restored == 2);
    ensure!(report.dropped_terminal == 1);
    ensure!(notifier.count() == 1);
    ensure!(
        restarted.task(&task_id("running")).map(Task::status)
            == Some(TaskStatus::InProgress)
    );
    ensure!(
        restarted.task(&task_id("queued")).map(Task::status) == Some(TaskStatus::Ready)
    );
    ensure!(restarted.task(&task_id("finished")).is_none());
    ensure!(fresh.write_count()? == 0);
    Ok(())
}
