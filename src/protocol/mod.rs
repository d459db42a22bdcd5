//! Request/response surface through which workers reach the queue.
//!
//! Requests are `{ method, params, id }` objects. Successful calls answer
//! `{ id, result: { success: true, .. } }` and failures answer
//! `{ id, error: { code, message } }`. Parameters are validated before any
//! state is touched.

mod envelope;
mod error;
mod facade;
mod method;
mod params;
mod payload;

pub use envelope::{ErrorCode, ErrorObject, ProtocolRequest, ProtocolResponse, RequestId, ResponseBody};
pub use error::ProtocolError;
pub use facade::ProtocolFacade;
pub use method::{MethodDescriptor, PROTOCOL_VERSION, ProtocolMethod, catalog};
pub use params::{
    AskQuestionParams, GetNextTaskParams, OneOrMany, ReportObservationParams,
    ReportTaskStatusParams, ReportTestFailureParams, ReportVerificationResultParams,
    StatusDetails, VerificationParams,
};
pub use payload::{
    MetadataView, NextTaskPayload, ObservationPayload, ObservationView, StatusPayload, TaskView,
    TicketPayload, VerificationPayload, VerificationView,
};

#[cfg(test)]
mod tests;
