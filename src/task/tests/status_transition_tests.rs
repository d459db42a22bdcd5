//! Unit tests for task status transition validation.

use super::fixtures::created;
use crate::task::domain::{Priority, Task, TaskDomainError, TaskStatus};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn pending_task() -> Task {
    created("transition-subject", Priority::P2)
}

#[rstest]
#[case(TaskStatus::Pending, TaskStatus::Pending, false)]
#[case(TaskStatus::Pending, TaskStatus::Ready, true)]
#[case(TaskStatus::Pending, TaskStatus::InProgress, false)]
#[case(TaskStatus::Pending, TaskStatus::Completed, false)]
#[case(TaskStatus::Pending, TaskStatus::Blocked, true)]
#[case(TaskStatus::Pending, TaskStatus::Failed, false)]
#[case(TaskStatus::Ready, TaskStatus::Pending, false)]
#[case(TaskStatus::Ready, TaskStatus::Ready, false)]
#[case(TaskStatus::Ready, TaskStatus::InProgress, true)]
#[case(TaskStatus::Ready, TaskStatus::Completed, false)]
#[case(TaskStatus::Ready, TaskStatus::Blocked, false)]
#[case(TaskStatus::Ready, TaskStatus::Failed, false)]
#[case(TaskStatus::InProgress, TaskStatus::Pending, false)]
#[case(TaskStatus::InProgress, TaskStatus::Ready, false)]
#[case(TaskStatus::InProgress, TaskStatus::InProgress, false)]
#[case(TaskStatus::InProgress, TaskStatus::Completed, true)]
#[case(TaskStatus::InProgress, TaskStatus::Blocked, true)]
#[case(TaskStatus::InProgress, TaskStatus::Failed, true)]
#[case(TaskStatus::Completed, TaskStatus::Pending, false)]
#[case(TaskStatus::Completed, TaskStatus::Ready, false)]
#[case(TaskStatus::Completed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Completed, TaskStatus::Completed, false)]
#[case(TaskStatus::Completed, TaskStatus::Blocked, false)]
#[case(TaskStatus::Completed, TaskStatus::Failed, false)]
#[case(TaskStatus::Blocked, TaskStatus::Pending, false)]
#[case(TaskStatus::Blocked, TaskStatus::Ready, true)]
#[case(TaskStatus::Blocked, TaskStatus::InProgress, false)]
#[case(TaskStatus::Blocked, TaskStatus::Completed, false)]
#[case(TaskStatus::Blocked, TaskStatus::Blocked, false)]
#[case(TaskStatus::Blocked, TaskStatus::Failed, false)]
#[case(TaskStatus::Failed, TaskStatus::Pending, false)]
#[case(TaskStatus::Failed, TaskStatus::Ready, false)]
#[case(TaskStatus::Failed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Failed, TaskStatus::Completed, false)]
#[case(TaskStatus::Failed, TaskStatus::Blocked, false)]
#[case(TaskStatus::Failed, TaskStatus::Failed, false)]
fn can_transition_to_returns_expected(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(TaskStatus::Pending, false)]
#[case(TaskStatus::Ready, false)]
#[case(TaskStatus::InProgress, false)]
#[case(TaskStatus::Blocked, false)]
#[case(TaskStatus::Completed, true)]
#[case(TaskStatus::Failed, true)]
fn is_terminal_returns_expected(#[case] status: TaskStatus, #[case] expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[rstest]
#[case("IN_PROGRESS", TaskStatus::InProgress)]
#[case("in-progress", TaskStatus::InProgress)]
#[case("blocked", TaskStatus::Blocked)]
fn status_parses_from_wire_text(#[case] raw: &str, #[case] expected: TaskStatus) -> eyre::Result<()> {
    ensure!(TaskStatus::try_from(raw)? == expected);
    Ok(())
}

#[rstest]
fn status_rejects_unknown_text() {
    assert!(TaskStatus::try_from("DONE").is_err());
}

#[rstest]
fn priorities_order_most_urgent_first() {
    let mut priorities = vec![Priority::P3, Priority::P1, Priority::P2];
    priorities.sort();
    assert_eq!(priorities, vec![Priority::P1, Priority::P2, Priority::P3]);
}

#[rstest]
fn transition_from_pending_to_ready_succeeds(
    clock: DefaultClock,
    pending_task: Task,
) -> eyre::Result<()> {
    let mut task = pending_task;
    let original_updated_at = task.updated_at();

    task.transition_to(TaskStatus::Ready, &clock)?;

    ensure!(task.status() == TaskStatus::Ready);
    ensure!(task.updated_at() >= original_updated_at);
    Ok(())
}

#[rstest]
fn transition_from_pending_to_completed_is_rejected(
    clock: DefaultClock,
    pending_task: Task,
) -> eyre::Result<()> {
    let mut task = pending_task;
    let original_updated_at = task.updated_at();

    let result = task.transition_to(TaskStatus::Completed, &clock);
    let expected = Err(TaskDomainError::InvalidStateTransition {
        task_id: task.id().clone(),
        from: TaskStatus::Pending,
        to: TaskStatus::Completed,
    });

    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    ensure!(task.status() == TaskStatus::Pending);
    ensure!(task.updated_at() == original_updated_at);
    Ok(())
}

#[rstest]
#[case(TaskStatus::Completed)]
#[case(TaskStatus::Failed)]
fn terminal_status_rejects_all_transitions(
    #[case] terminal: TaskStatus,
    clock: DefaultClock,
    pending_task: Task,
) -> eyre::Result<()> {
    let mut task = pending_task;
    task.transition_to(TaskStatus::Ready, &clock)?;
    task.transition_to(TaskStatus::InProgress, &clock)?;
    task.transition_to(terminal, &clock)?;

    for target in TaskStatus::ALL {
        let result = task.transition_to(target, &clock);
        let expected = Err(TaskDomainError::InvalidStateTransition {
            task_id: task.id().clone(),
            from: terminal,
            to: target,
        });
        if result != expected {
            bail!("expected {expected:?}, got {result:?}");
        }
        ensure!(task.status() == terminal);
    }
    Ok(())
}

#[rstest]
fn holds_are_deduplicated_and_released_individually(
    clock: DefaultClock,
    pending_task: Task,
) -> eyre::Result<()> {
    let mut task = pending_task;
    let first = super::fixtures::task_id("hold-a");
    let second = super::fixtures::task_id("hold-b");

    task.add_holds([first.clone(), second.clone(), first.clone()], &clock);
    ensure!(task.blocked_by() == [first.clone(), second.clone()]);

    ensure!(task.release_hold(&first, &clock));
    ensure!(!task.release_hold(&first, &clock));
    ensure!(task.blocked_by() == [second]);
    ensure!(task.is_held());
    Ok(())
}
