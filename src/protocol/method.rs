//! Versioned method catalog.

use super::error::ProtocolError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Current protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Operations a worker may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolMethod {
    /// Peek at the next eligible task.
    GetNextTask,
    /// Report a status change.
    ReportTaskStatus,
    /// Append a worker observation.
    ReportObservation,
    /// Raise a ticket for a failing test.
    ReportTestFailure,
    /// Record a verification signal.
    ReportVerificationResult,
    /// Raise a clarification ticket.
    AskQuestion,
}

impl ProtocolMethod {
    /// Every method, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::GetNextTask,
        Self::ReportTaskStatus,
        Self::ReportObservation,
        Self::ReportTestFailure,
        Self::ReportVerificationResult,
        Self::AskQuestion,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetNextTask => "getNextTask",
            Self::ReportTaskStatus => "reportTaskStatus",
            Self::ReportObservation => "reportObservation",
            Self::ReportTestFailure => "reportTestFailure",
            Self::ReportVerificationResult => "reportVerificationResult",
            Self::AskQuestion => "askQuestion",
        }
    }

    /// Returns a one-line description for the catalog.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetNextTask => {
                "Return the highest-priority eligible task and the tasks queued behind it without claiming it."
            }
            Self::ReportTaskStatus => {
                "Move a task along its lifecycle, optionally with a summary, holds, and verification outcome."
            }
            Self::ReportObservation => "Append an observation to a task's feedback log.",
            Self::ReportTestFailure => "Raise a P1 ticket to fix a failing test.",
            Self::ReportVerificationResult => "Record a verification result against a task.",
            Self::AskQuestion => "Raise a clarification ticket, optionally blocking the asking task.",
        }
    }

    /// Returns the JSON schema of the method's parameters.
    #[must_use]
    pub fn input_schema(self) -> Value {
        let task_id = json!({"type": "string", "minLength": 1, "maxLength": 128});
        let statuses = json!({
            "type": "string",
            "enum": ["PENDING", "READY", "IN_PROGRESS", "COMPLETED", "BLOCKED", "FAILED"]
        });
        let priorities = json!({"type": "string", "enum": ["P1", "P2", "P3"]});
        let routing = json!({
            "type": "string",
            "enum": ["planner", "architect", "coder", "reviewer", "executor"]
        });
        match self {
            Self::GetNextTask => json!({
                "type": "object",
                "properties": {
                    "statusFilter": {"oneOf": [statuses, {"type": "array", "items": statuses}]},
                    "priorityFilter": {"oneOf": [priorities, {"type": "array", "items": priorities}]},
                    "routing": routing,
                    "previewLimit": {"type": "integer", "minimum": 0, "maximum": 10}
                },
                "additionalProperties": false
            }),
            Self::ReportTaskStatus => json!({
                "type": "object",
                "properties": {
                    "taskId": task_id,
                    "status": statuses,
                    "details": {
                        "type": "object",
                        "properties": {
                            "summary": {"type": "string"},
                            "blockedBy": {"type": "array", "items": task_id},
                            "verification": {
                                "type": "object",
                                "properties": {
                                    "passed": {"type": "boolean"},
                                    "summary": {"type": "string"}
                                },
                                "required": ["passed"],
                                "additionalProperties": false
                            }
                        },
                        "additionalProperties": false
                    }
                },
                "required": ["taskId", "status"],
                "additionalProperties": false
            }),
            Self::ReportObservation => json!({
                "type": "object",
                "properties": {
                    "taskId": task_id,
                    "message": {"type": "string", "minLength": 1},
                    "severity": {"type": "string", "enum": ["info", "warning", "error"]},
                    "role": routing
                },
                "required": ["taskId", "message"],
                "additionalProperties": false
            }),
            Self::ReportTestFailure => json!({
                "type": "object",
                "properties": {
                    "testName": {"type": "string", "minLength": 1},
                    "message": {"type": "string", "minLength": 1},
                    "taskId": task_id,
                    "ticketId": {"type": "string", "minLength": 1}
                },
                "required": ["testName", "message"],
                "additionalProperties": false
            }),
            Self::ReportVerificationResult => json!({
                "type": "object",
                "properties": {
                    "taskId": task_id,
                    "passed": {"type": "boolean"},
                    "summary": {"type": "string"}
                },
                "required": ["taskId", "passed"],
                "additionalProperties": false
            }),
            Self::AskQuestion => json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "minLength": 1},
                    "taskId": task_id,
                    "ticketId": {"type": "string", "minLength": 1},
                    "blocking": {"type": "boolean"}
                },
                "required": ["question"],
                "additionalProperties": false
            }),
        }
    }

    /// Returns the catalog entry for this method.
    #[must_use]
    pub fn descriptor(self) -> MethodDescriptor {
        MethodDescriptor {
            name: self.as_str(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl TryFrom<&str> for ProtocolMethod {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == value)
            .ok_or_else(|| ProtocolError::MethodNotFound(value.to_owned()))
    }
}

impl fmt::Display for ProtocolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry describing one method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Wire name.
    pub name: &'static str,
    /// Human-readable summary.
    pub description: &'static str,
    /// JSON schema of the parameters.
    pub input_schema: Value,
}

/// Returns the catalog of every supported method.
#[must_use]
pub fn catalog() -> Vec<MethodDescriptor> {
    ProtocolMethod::ALL
        .into_iter()
        .map(ProtocolMethod::descriptor)
        .collect()
}
