//! Then steps for queue BDD scenarios.

use super::world::{QueueWorld, run_async};
use rstest_bdd_macros::then;
use serde_json::Value;

#[then(r#"the next task is "{id}""#)]
fn next_task_is(world: &QueueWorld, id: String) -> Result<(), eyre::Report> {
    let response = world.last_response()?;
    let actual = response.pointer("/result/task/id").and_then(Value::as_str);
    if actual != Some(id.as_str()) {
        return Err(eyre::eyre!("expected next task {id}, got {response}"));
    }
    Ok(())
}

#[then(r#"the response error code is "{code}""#)]
fn response_error_code_is(world: &QueueWorld, code: String) -> Result<(), eyre::Report> {
    let response = world.last_response()?;
    let actual = response.pointer("/error/code").and_then(Value::as_str);
    if actual != Some(code.as_str()) {
        return Err(eyre::eyre!("expected error {code}, got {response}"));
    }
    Ok(())
}

#[then("the last ticket was not created")]
fn last_ticket_not_created(world: &QueueWorld) -> Result<(), eyre::Report> {
    let response = world.last_response()?;
    if response.pointer("/result/created") != Some(&Value::Bool(false)) {
        return Err(eyre::eyre!("expected a suppressed ticket, got {response}"));
    }
    Ok(())
}

#[then("the queue holds {count:usize} tasks")]
fn queue_holds(world: &QueueWorld, count: usize) -> Result<(), eyre::Report> {
    let total = run_async(async { world.facade.queue().lock().await.store().len() });
    if total != count {
        return Err(eyre::eyre!("expected {count} tasks, found {total}"));
    }
    Ok(())
}
