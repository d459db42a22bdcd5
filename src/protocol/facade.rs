//! Validates worker calls and dispatches them to the queue.

use super::envelope::{ProtocolRequest, ProtocolResponse, RequestId};
use super::error::ProtocolError;
use super::method::ProtocolMethod;
use super::params::{
    AskQuestionParams, GetNextTaskParams, ReportObservationParams, ReportTaskStatusParams,
    ReportTestFailureParams, ReportVerificationResultParams, parse_params,
};
use super::payload::{
    NextTaskPayload, ObservationPayload, StatusPayload, TaskView, TicketPayload,
    VerificationPayload,
};
use crate::config::QueueConfig;
use crate::task::ports::{QueueNotifier, SnapshotStore};
use crate::task::services::{
    QuestionRequest, QueueHandle, StatusReport, TaskFilter, TestFailureReport,
};
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

const FALLBACK_RESPONSE: &str =
    r#"{"id":null,"error":{"code":"INTERNAL_ERROR","message":"internal error"}}"#;

/// Protocol entry point for workers.
pub struct ProtocolFacade<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    handle: QueueHandle<S, N, C>,
}

impl<S, N, C> ProtocolFacade<S, N, C>
where
    S: SnapshotStore + 'static,
    N: QueueNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a facade over a queue handle.
    #[must_use]
    pub const fn new(handle: QueueHandle<S, N, C>) -> Self {
        Self { handle }
    }

    /// Returns the queue handle.
    #[must_use]
    pub const fn queue(&self) -> &QueueHandle<S, N, C> {
        &self.handle
    }

    /// Handles one decoded request.
    pub async fn handle(&self, request: ProtocolRequest) -> ProtocolResponse {
        let ProtocolRequest { method, params, id, .. } = request;
        let outcome = match ProtocolMethod::try_from(method.as_str()) {
            Ok(resolved) => self.dispatch(resolved, params).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(payload) => ProtocolResponse::success(Some(id), payload),
            Err(err) => {
                debug!(method = %method, request = %id, code = %err.code(), "request rejected");
                ProtocolResponse::failure(Some(id), &err)
            }
        }
    }

    /// Handles a serialised request and returns a serialised response.
    ///
    /// Input that is not a request answers with `VALIDATION_ERROR`; the id
    /// is echoed when it can be read and `null` otherwise.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match decode_request(raw) {
            Ok(request) => self.handle(request).await,
            Err((id, err)) => ProtocolResponse::failure(id, &err),
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            error!(error = %err, "response serialisation failed");
            FALLBACK_RESPONSE.to_owned()
        })
    }

    async fn dispatch(&self, method: ProtocolMethod, params: Value) -> Result<Value, ProtocolError> {
        match method {
            ProtocolMethod::GetNextTask => self.get_next_task(parse_params(params)?).await,
            ProtocolMethod::ReportTaskStatus => {
                self.report_task_status(parse_params(params)?).await
            }
            ProtocolMethod::ReportObservation => {
                self.report_observation(parse_params(params)?).await
            }
            ProtocolMethod::ReportTestFailure => {
                self.report_test_failure(parse_params(params)?).await
            }
            ProtocolMethod::ReportVerificationResult => {
                self.report_verification_result(parse_params(params)?).await
            }
            ProtocolMethod::AskQuestion => self.ask_question(parse_params(params)?).await,
        }
    }

    async fn get_next_task(&self, params: GetNextTaskParams) -> Result<Value, ProtocolError> {
        let mut filter = TaskFilter::new();
        if let Some(statuses) = params.status_filter {
            filter = filter.with_statuses(statuses.into_vec());
        }
        if let Some(priorities) = params.priority_filter {
            filter = filter.with_priorities(priorities.into_vec());
        }
        if let Some(routing) = params.routing {
            filter = filter.with_routing(routing);
        }

        let controller = self.handle.lock().await;
        let limit = params
            .preview_limit
            .unwrap_or(controller.config().preview_limit)
            .min(QueueConfig::MAX_PREVIEW);
        let preview = controller.preview(&filter, limit);
        to_payload(&NextTaskPayload {
            task: preview.next.map(TaskView::from),
            upcoming: preview.upcoming.into_iter().map(TaskView::from).collect(),
        })
    }

    async fn report_task_status(
        &self,
        params: ReportTaskStatusParams,
    ) -> Result<Value, ProtocolError> {
        let mut report = StatusReport::new(params.task_id, params.status);
        if let Some(details) = params.details {
            if let Some(summary) = details.summary {
                report = report.with_summary(summary);
            }
            if let Some(verification) = details.verification {
                report = report.with_verification(verification.passed, verification.summary);
            }
            report = report.with_blocked_by(details.blocked_by);
        }

        let change = self.handle.lock().await.report_status(report)?;
        to_payload(&StatusPayload {
            task: TaskView::from(&change.task),
            previous_status: change.previous,
            follow_up_task_id: change.follow_up,
            released_task_ids: change.released,
        })
    }

    async fn report_observation(
        &self,
        params: ReportObservationParams,
    ) -> Result<Value, ProtocolError> {
        let task = self.handle.lock().await.record_observation(
            &params.task_id,
            &params.message,
            params.severity,
            params.role,
        )?;
        to_payload(&ObservationPayload {
            task: TaskView::from(&task),
        })
    }

    async fn report_test_failure(
        &self,
        params: ReportTestFailureParams,
    ) -> Result<Value, ProtocolError> {
        let mut report = TestFailureReport::new(params.test_name, params.message);
        if let Some(task_id) = params.task_id {
            report = report.with_task_id(task_id);
        }
        if let Some(ticket_id) = params.ticket_id {
            report = report.with_ticket_id(ticket_id);
        }
        let outcome = self.handle.lock().await.raise_test_failure(report)?;
        to_payload(&TicketPayload::from(&outcome))
    }

    async fn report_verification_result(
        &self,
        params: ReportVerificationResultParams,
    ) -> Result<Value, ProtocolError> {
        let outcome = self.handle.lock().await.record_verification(
            &params.task_id,
            params.passed,
            params.summary,
        )?;
        to_payload(&VerificationPayload {
            task: TaskView::from(&outcome.task),
            follow_up_task_id: outcome.follow_up,
        })
    }

    async fn ask_question(&self, params: AskQuestionParams) -> Result<Value, ProtocolError> {
        let mut request = QuestionRequest::new(params.question).blocking(params.blocking);
        if let Some(task_id) = params.task_id {
            request = request.with_task_id(task_id);
        }
        if let Some(ticket_id) = params.ticket_id {
            request = request.with_ticket_id(ticket_id);
        }
        let outcome = self.handle.lock().await.ask_question(request)?;
        let mut payload = TicketPayload::from(&outcome.question);
        payload.blocked_task_id = outcome.blocked_task;
        to_payload(&payload)
    }
}

fn decode_request(raw: &str) -> Result<ProtocolRequest, (Option<RequestId>, ProtocolError)> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| (None, ProtocolError::validation(format!("malformed JSON: {err}"))))?;
    let id = value
        .get("id")
        .and_then(|raw_id| serde_json::from_value::<RequestId>(raw_id.clone()).ok());
    serde_json::from_value(value).map_err(|err| (id, ProtocolError::validation(err)))
}

fn to_payload(payload: &impl Serialize) -> Result<Value, ProtocolError> {
    serde_json::to_value(payload).map_err(|err| {
        error!(error = %err, "payload serialisation failed");
        ProtocolError::Internal
    })
}
