//! HTTP error response conversion
//!
//! Wraps `JobError` for axum (orphan rules keep `IntoResponse` out of
//! vidforge-core). Responses carry the taxonomy discriminator and the job id
//! so callers can correlate with engine diagnostics in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;
use vidforge_core::JobError;

#[derive(Debug)]
pub struct ApiError {
    pub job_id: Uuid,
    pub error: JobError,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    /// Machine-readable discriminator matching the job error taxonomy.
    kind: &'static str,
    job_id: Uuid,
}

fn status_for(error: &JobError) -> StatusCode {
    match error {
        JobError::Validation(_) | JobError::GraphResolution(_) => StatusCode::BAD_REQUEST,
        JobError::ResourceFetch { .. } => StatusCode::BAD_GATEWAY,
        JobError::ProcessTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        JobError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        JobError::ProcessFailure { .. }
        | JobError::OutputMissing
        | JobError::Delivery(_)
        | JobError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);

        tracing::warn!(
            job_id = %self.job_id,
            kind = self.error.kind(),
            status = status.as_u16(),
            error = %self.error,
            "render request failed"
        );

        let body = ErrorResponse {
            error: self.error.to_string(),
            kind: self.error.kind(),
            job_id: self.job_id,
        };
        (status, Json(body)).into_response()
    }
}
