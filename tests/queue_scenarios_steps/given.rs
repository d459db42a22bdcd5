//! Given steps for queue BDD scenarios.

use super::world::{QueueWorld, run_async};
use atelier::task::domain::{NewTask, Priority, TaskId};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn queue_task(
    world: &QueueWorld,
    id: &str,
    priority: &str,
    dependencies: Vec<TaskId>,
) -> Result<(), eyre::Report> {
    let parsed = Priority::try_from(priority)
        .map_err(|err| eyre::eyre!("invalid priority in scenario: {err}"))?;
    let request = NewTask::new(format!("Task {id}"), format!("Scenario work for {id}"), parsed)
        .with_id(TaskId::new(id)?)
        .with_dependencies(dependencies);
    run_async(async {
        world.facade.queue().lock().await.add_task(request)
    })
    .wrap_err("queue task for scenario")?;
    Ok(())
}

#[given(r#"a queued task "{id}" with priority "{priority}""#)]
fn queued_task(world: &mut QueueWorld, id: String, priority: String) -> Result<(), eyre::Report> {
    queue_task(world, &id, &priority, Vec::new())
}

#[given(r#"a dependent task "{id}" with priority "{priority}" after "{dependency}""#)]
fn queued_dependent_task(
    world: &mut QueueWorld,
    id: String,
    priority: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    queue_task(world, &id, &priority, vec![TaskId::new(dependency)?])
}
