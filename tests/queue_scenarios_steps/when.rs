//! When steps for queue BDD scenarios.

use super::world::QueueWorld;
use rstest_bdd_macros::when;
use serde_json::json;

#[when("the worker asks for the next task")]
fn ask_for_next_task(world: &mut QueueWorld) -> Result<(), eyre::Report> {
    world.call("getNextTask", json!({}))?;
    Ok(())
}

#[when(r#"the worker claims "{id}""#)]
fn claim_task(world: &mut QueueWorld, id: String) -> Result<(), eyre::Report> {
    let response = world.call(
        "reportTaskStatus",
        json!({"taskId": id, "status": "IN_PROGRESS"}),
    )?;
    if response.get("error").is_some() {
        return Err(eyre::eyre!("claim rejected: {response}"));
    }
    Ok(())
}

#[when(r#"the worker reports "{id}" as "{status}""#)]
fn report_status(world: &mut QueueWorld, id: String, status: String) -> Result<(), eyre::Report> {
    world.call("reportTaskStatus", json!({"taskId": id, "status": status}))?;
    Ok(())
}

#[when(r#"the worker reports failing test "{test_name}""#)]
fn report_failing_test(world: &mut QueueWorld, test_name: String) -> Result<(), eyre::Report> {
    world.call(
        "reportTestFailure",
        json!({"testName": test_name, "message": "assertion failed"}),
    )?;
    Ok(())
}
