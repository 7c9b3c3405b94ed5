//! Request handlers
//!
//! One real route: POST /render accepts a RenderJob body, runs it to
//! completion, and answers with either the storage reference or the raw
//! artifact bytes. The job itself runs in a spawned task so that a client
//! disconnect cancels the engine but never skips workspace cleanup.

use anyhow::anyhow;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use vidforge_core::{DeliveryResult, JobError, RenderJob};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/render", post(render))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct RenderResponse {
    job_id: Uuid,
    url: String,
    key: String,
    size_bytes: u64,
}

async fn render(
    State(state): State<AppState>,
    Json(job): Json<RenderJob>,
) -> Result<Response, ApiError> {
    let job_id = Uuid::new_v4();

    let permit = state
        .job_slots
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError {
            job_id,
            error: JobError::Internal(anyhow!("job slots closed")),
        })?;

    // If this handler is dropped (client went away), the guard cancels the
    // token; the spawned job terminates the engine and still runs cleanup.
    let cancel = CancellationToken::new();
    let _disconnect_guard = cancel.clone().drop_guard();

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move {
        let result = orchestrator.execute_with_id(job_id, job, &cancel).await;
        drop(permit);
        result
    })
    .await
    .map_err(|e| ApiError {
        job_id,
        error: JobError::Internal(anyhow!("job task failed: {e}")),
    })?;

    let delivery = outcome.map_err(|error| ApiError { job_id, error })?;

    match delivery {
        DeliveryResult::Stored {
            key,
            url,
            size_bytes,
        } => Ok(Json(RenderResponse {
            job_id,
            url,
            key,
            size_bytes,
        })
        .into_response()),
        DeliveryResult::Inline { data, content_type } => {
            Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
        }
    }
}
