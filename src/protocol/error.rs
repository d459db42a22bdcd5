//! Error taxonomy surfaced through the protocol envelope.

use super::envelope::ErrorCode;
use crate::task::domain::{TaskDomainError, TaskId};
use crate::task::services::LifecycleError;
use thiserror::Error;

/// Errors a protocol call can answer with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request or its parameters were rejected before dispatch.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The method is unknown.
    #[error("unknown method: {0}")]
    MethodNotFound(String),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The call conflicts with the task lifecycle.
    #[error("{0}")]
    InvalidState(String),

    /// Unexpected failure; details are logged, not returned.
    #[error("internal error")]
    Internal,
}

impl ProtocolError {
    /// Creates a validation error from any displayable reason.
    #[must_use]
    pub fn validation(reason: impl std::fmt::Display) -> Self {
        Self::Validation(reason.to_string())
    }

    /// Returns the wire code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::TaskNotFound(_) => ErrorCode::TaskNotFound,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Internal => ErrorCode::InternalError,
        }
    }
}

impl From<LifecycleError> for ProtocolError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(id) => Self::TaskNotFound(id),
            LifecycleError::Domain(TaskDomainError::InvalidStateTransition { .. })
            | LifecycleError::NotInProgress { .. }
            | LifecycleError::ActiveTaskExists { .. }
            | LifecycleError::DependenciesUnmet(_) => Self::InvalidState(err.to_string()),
            LifecycleError::Domain(_)
            | LifecycleError::DuplicateTaskId(_)
            | LifecycleError::CyclicDependency { .. }
            | LifecycleError::MissingHolds(_)
            | LifecycleError::SelfHold(_)
            | LifecycleError::EmptyField(_) => Self::Validation(err.to_string()),
        }
    }
}
