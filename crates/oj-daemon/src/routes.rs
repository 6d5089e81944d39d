//! Operator-facing HTTP surface (§4.G). This is explicitly not the
//! submission API — it exists for health checks and debugging.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use oj_queue::{IN_FLIGHT_KEY, PENDING_KEY};
use oj_schemas::Submission;
use serde::Serialize;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/status", get(status))
        .route("/v1/queue/depth", get(queue_depth))
        .route("/v1/submissions/:id", get(get_submission))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct StatusResponse {
    service: &'static str,
    version: &'static str,
    uptime_secs: u64,
    worker_concurrency: usize,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "oj-daemon",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        worker_concurrency: state.config.worker_concurrency,
    })
}

async fn queue_depth(
    State(state): State<Arc<AppState>>,
) -> Result<Json<oj_queue::QueueDepth>, StatusCode> {
    oj_metrics::read_queue_depth(&state.broker, PENDING_KEY, IN_FLIGHT_KEY)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(error = %e, "queue depth read failed");
            StatusCode::SERVICE_UNAVAILABLE
        })
}

async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Submission>, StatusCode> {
    match state.submissions.get_submission(id).await {
        Ok(Some(submission)) => Ok(Json(submission)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!(submission_id = id, error = %e, "get_submission failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
