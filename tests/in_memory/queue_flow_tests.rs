//! Worker flows spanning several lifecycle operations.

use super::helpers::{TestController, controller_over, draft, run_to, snapshots, task_id};
use atelier::task::{
    adapters::memory::InMemorySnapshotStore,
    domain::{Priority, TaskStatus},
    services::{QuestionRequest, StatusReport, TaskFilter},
};
use eyre::{OptionExt, ensure};
use rstest::rstest;
use std::sync::Arc;

fn next_id(controller: &TestController) -> Option<String> {
    controller
        .next_task(&TaskFilter::new())
        .map(|task| task.id().as_str().to_owned())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dependency_chain_is_served_in_order(
    snapshots: Arc<InMemorySnapshotStore>,
) -> eyre::Result<()> {
    let mut controller = controller_over(&snapshots)?;
    controller.add_task(draft("design", Priority::P2)?)?;
    controller.add_task(draft("build", Priority::P1)?.with_dependencies([task_id("design")?]))?;
    controller.add_task(draft("ship", Priority::P1)?.with_dependencies([task_id("build")?]))?;

    let mut served = Vec::new();
    while let Some(id) = next_id(&controller) {
        run_to(&mut controller, &id, TaskStatus::Completed)?;
        served.push(id);
    }

    ensure!(served == ["design", "build", "ship"], "served {served:?}");
    ensure!(controller.queue_status().by_status.completed == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_task_is_investigated_before_other_work(
    snapshots: Arc<InMemorySnapshotStore>,
) -> eyre::Result<()> {
    let mut controller = controller_over(&snapshots)?;
    controller.add_task(draft("flaky", Priority::P2)?)?;
    controller.add_task(draft("routine", Priority::P2)?)?;

    run_to(&mut controller, "flaky", TaskStatus::Failed)?;

    let next = controller
        .next_task(&TaskFilter::new())
        .ok_or_eyre("expected an eligible task")?;
    ensure!(next.priority() == Priority::P1);
    ensure!(next.metadata().follow_up_of() == Some(&task_id("flaky")?));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn answered_question_unblocks_the_asker(
    snapshots: Arc<InMemorySnapshotStore>,
) -> eyre::Result<()> {
    let mut controller = controller_over(&snapshots)?;
    controller.add_task(draft("asker", Priority::P2)?)?;
    controller.report_status(StatusReport::new(task_id("asker")?, TaskStatus::InProgress))?;

    let outcome = controller.ask_question(
        QuestionRequest::new("Should the cache be per tenant?")
            .with_task_id(task_id("asker")?)
            .blocking(true),
    )?;
    let question = outcome.question.task_id().clone();
    ensure!(outcome.blocked_task == Some(task_id("asker")?));
    ensure!(next_id(&controller).as_deref() == Some(question.as_str()));

    controller.report_status(StatusReport::new(question.clone(), TaskStatus::InProgress))?;
    let change = controller.report_status(StatusReport::new(question, TaskStatus::Completed))?;

    ensure!(change.released == [task_id("asker")?]);
    let asker = controller
        .task(&task_id("asker")?)
        .ok_or_eyre("asker missing")?;
    ensure!(asker.status() == TaskStatus::Ready);
    ensure!(next_id(&controller).as_deref() == Some("asker"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn external_hold_release_restores_eligibility(
    snapshots: Arc<InMemorySnapshotStore>,
) -> eyre::Result<()> {
    let mut controller = controller_over(&snapshots)?;
    controller.add_task(draft("gated", Priority::P1)?.with_blocked_by([task_id("approval")?]))?;

    ensure!(next_id(&controller).is_none());
    ensure!(controller.release_hold(&task_id("approval")?) == [task_id("gated")?]);
    ensure!(next_id(&controller).as_deref() == Some("gated"));
    Ok(())
}
