//! Typed parameters for each protocol method.
//!
//! Unknown fields are rejected so typos surface as validation errors rather
//! than silently ignored options.

use super::error::ProtocolError;
use crate::config::QueueConfig;
use crate::task::domain::{Priority, RoutingTag, Severity, TaskId, TaskStatus, TicketId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// One value.
    One(T),
    /// Several values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Parameters of `getNextTask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetNextTaskParams {
    /// Statuses to select from.
    #[serde(default)]
    pub status_filter: Option<OneOrMany<TaskStatus>>,
    /// Priorities to select from.
    #[serde(default)]
    pub priority_filter: Option<OneOrMany<Priority>>,
    /// Worker class to select for.
    #[serde(default)]
    pub routing: Option<RoutingTag>,
    /// Number of upcoming tasks to include.
    #[serde(default)]
    pub preview_limit: Option<usize>,
}

/// Verification outcome attached to a status report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationParams {
    /// Whether verification passed.
    pub passed: bool,
    /// Optional verification summary.
    #[serde(default)]
    pub summary: Option<String>,
}

/// Optional details of a status report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusDetails {
    /// Worker summary of the outcome.
    #[serde(default)]
    pub summary: Option<String>,
    /// Holds to place when reporting `BLOCKED`.
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    /// Verification outcome.
    #[serde(default)]
    pub verification: Option<VerificationParams>,
}

/// Parameters of `reportTaskStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportTaskStatusParams {
    /// Reported task.
    pub task_id: TaskId,
    /// Requested status.
    pub status: TaskStatus,
    /// Optional outcome details.
    #[serde(default)]
    pub details: Option<StatusDetails>,
}

/// Parameters of `reportObservation`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportObservationParams {
    /// Observed task.
    pub task_id: TaskId,
    /// Observation text.
    pub message: String,
    /// Observation severity, `info` when omitted.
    #[serde(default)]
    pub severity: Severity,
    /// Worker class making the observation.
    #[serde(default)]
    pub role: Option<RoutingTag>,
}

/// Parameters of `reportTestFailure`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportTestFailureParams {
    /// Failing test.
    pub test_name: String,
    /// Failure output.
    pub message: String,
    /// Task whose work surfaced the failure.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// External ticket for deduplication.
    #[serde(default)]
    pub ticket_id: Option<TicketId>,
}

/// Parameters of `reportVerificationResult`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportVerificationResultParams {
    /// Verified task.
    pub task_id: TaskId,
    /// Whether verification passed.
    pub passed: bool,
    /// Optional verification summary.
    #[serde(default)]
    pub summary: Option<String>,
}

/// Parameters of `askQuestion`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AskQuestionParams {
    /// Question text.
    pub question: String,
    /// Task the question is about.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// External ticket for deduplication.
    #[serde(default)]
    pub ticket_id: Option<TicketId>,
    /// Whether the asking task waits for the answer.
    #[serde(default)]
    pub blocking: bool,
}

/// Parameter types that carry checks beyond their shape.
pub(crate) trait ValidatedParams: DeserializeOwned {
    fn check(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

impl ValidatedParams for GetNextTaskParams {
    fn check(&self) -> Result<(), ProtocolError> {
        match self.preview_limit {
            Some(limit) if limit > QueueConfig::MAX_PREVIEW => Err(ProtocolError::Validation(
                format!("previewLimit must be at most {}", QueueConfig::MAX_PREVIEW),
            )),
            _ => Ok(()),
        }
    }
}

impl ValidatedParams for ReportTaskStatusParams {
    fn check(&self) -> Result<(), ProtocolError> {
        let no_holds = self
            .details
            .as_ref()
            .is_none_or(|details| details.blocked_by.is_empty());
        if self.status == TaskStatus::Blocked && no_holds {
            return Err(ProtocolError::validation(
                "details.blockedBy must name at least one hold when reporting BLOCKED",
            ));
        }
        Ok(())
    }
}

impl ValidatedParams for ReportObservationParams {}
impl ValidatedParams for ReportTestFailureParams {}
impl ValidatedParams for ReportVerificationResultParams {}
impl ValidatedParams for AskQuestionParams {}

/// Decodes and checks method parameters.
///
/// `null` is read as an empty object.
pub(crate) fn parse_params<T: ValidatedParams>(params: Value) -> Result<T, ProtocolError> {
    let raw = match params {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let parsed: T = serde_json::from_value(raw).map_err(ProtocolError::validation)?;
    parsed.check()?;
    Ok(parsed)
}
