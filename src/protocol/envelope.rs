//! Request and response envelopes exchanged with workers.

use super::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Caller-chosen request identifier, echoed back in the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// Numeric identifier above `i64::MAX`.
    Unsigned(u64),
    /// String identifier.
    Text(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Unsigned(value), Self::Number)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A single call from a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolRequest {
    /// Operation name, for example `getNextTask`.
    pub method: String,
    /// Operation parameters; `null` and a missing field both mean `{}`.
    #[serde(default)]
    pub params: Value,
    /// Identifier echoed in the response.
    pub id: RequestId,
    /// JSON-RPC version marker; accepted and otherwise ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
}

impl ProtocolRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            id: id.into(),
            jsonrpc: None,
        }
    }
}

/// Stable error codes carried by failure responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request or parameters.
    ValidationError,
    /// The method is not part of the protocol.
    MethodNotFound,
    /// The referenced task does not exist.
    TaskNotFound,
    /// The request conflicts with the task's lifecycle.
    InvalidState,
    /// An unexpected internal failure.
    InternalError,
}

impl ErrorCode {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MethodNotFound => "METHOD_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body of a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Outcome half of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    /// Successful payload, always carrying `success: true`.
    Result(Value),
    /// Failure description.
    Error(ErrorObject),
}

/// Response to one [`ProtocolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolResponse {
    /// Echoed request id; `null` when the request could not be read.
    pub id: Option<RequestId>,
    /// Result or error.
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl ProtocolResponse {
    /// Builds a success response, marking the payload with `success: true`.
    ///
    /// Non-object payloads are nested under `value`.
    #[must_use]
    pub fn success(id: Option<RequestId>, payload: Value) -> Self {
        let mut result = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_owned(), other);
                map
            }
        };
        result.insert("success".to_owned(), Value::Bool(true));
        Self {
            id,
            body: ResponseBody::Result(Value::Object(result)),
        }
    }

    /// Builds a failure response from a protocol error.
    #[must_use]
    pub fn failure(id: Option<RequestId>, error: &ProtocolError) -> Self {
        Self {
            id,
            body: ResponseBody::Error(ErrorObject {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }

    /// Returns the success payload, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Result(value) => Some(value),
            ResponseBody::Error(_) => None,
        }
    }

    /// Returns the error body, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorObject> {
        match &self.body {
            ResponseBody::Result(_) => None,
            ResponseBody::Error(error) => Some(error),
        }
    }

    /// Returns `true` for success responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Result(_))
    }
}
