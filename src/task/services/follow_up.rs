//! Investigation tasks synthesised after failed or unverified work.

use crate::task::domain::{
    NewTask, Observation, Priority, RoutingTag, Severity, Task, TaskDomainError, TaskMetadata,
    TicketId,
};
use minijinja::{Environment, context};
use thiserror::Error;

const TITLE_TEMPLATE: &str = "Investigate {{ outcome }}: {{ title }}";

const DESCRIPTION_TEMPLATE: &str = "\
Task {{ id }} ({{ title }}) {{ outcome }}.
{% if summary %}Worker summary: {{ summary }}
{% endif %}{% if verification %}Verification: {{ verification }}
{% endif %}{% if errors %}Reported errors:
{% for error in errors %}- {{ error }}
{% endfor %}{% endif %}Find the root cause and propose a fix before the work is retried.";

/// Errors raised while composing an investigation task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FollowUpError {
    /// A template failed to render.
    #[error("failed to render investigation {part}: {reason}")]
    Render {
        /// Which part of the task was being rendered.
        part: &'static str,
        /// Renderer message.
        reason: String,
    },

    /// The rendered values were rejected by the domain.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
}

/// Returns the ticket id that keeps one open investigation per task.
///
/// # Errors
///
/// Returns [`TaskDomainError::EmptyTicketId`] only if the task id is blank,
/// which validated ids never are.
pub fn investigation_ticket(original: &Task) -> Result<TicketId, TaskDomainError> {
    TicketId::new(format!("investigate:{}", original.id()))
}

/// Builds the creation request for an investigation of `original`.
///
/// The task is `P1`, routed to a reviewer, escalated, and linked back to the
/// original through its metadata.
///
/// # Errors
///
/// Returns [`FollowUpError`] when rendering fails.
pub fn compose_investigation(
    original: &Task,
    summary: Option<&str>,
) -> Result<NewTask, FollowUpError> {
    let outcome = if original.has_failing_verification() {
        "failed verification"
    } else {
        "failed"
    };
    let errors: Vec<&str> = original
        .observations()
        .iter()
        .filter(|observation| observation.severity() == Severity::Error)
        .map(Observation::message)
        .collect();

    let values = context! {
        id => original.id().as_str(),
        title => original.title(),
        outcome => outcome,
        summary => summary,
        verification => original.verification().and_then(|signal| signal.summary()),
        errors => errors,
    };

    let environment = Environment::new();
    let title = environment
        .render_str(TITLE_TEMPLATE, &values)
        .map_err(|err| FollowUpError::Render {
            part: "title",
            reason: err.to_string(),
        })?;
    let description = environment
        .render_str(DESCRIPTION_TEMPLATE, &values)
        .map_err(|err| FollowUpError::Render {
            part: "description",
            reason: err.to_string(),
        })?;

    let metadata = TaskMetadata::new()
        .with_origin_ticket(investigation_ticket(original)?)
        .with_routing(RoutingTag::Reviewer)
        .escalate()
        .with_follow_up_of(original.id().clone());

    Ok(NewTask::new(title, description, Priority::P1).with_metadata(metadata))
}
