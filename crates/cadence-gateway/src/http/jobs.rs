//! Job listing and manual triggers.
//!
//! `POST /jobs/{id}/trigger` runs any registered job and answers once it ends.
//! `GET /trigger-1h` and `GET /trigger-2h` are kept as aliases for the two
//! built-in jobs.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use super::{api_error, timestamp, ApiError};
use crate::{app::AppState, jobs};

/// GET /jobs: every scheduled job with its next run time.
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "jobs": state.scheduler.jobs_info() }))
}

/// POST /jobs/{id}/trigger
///
/// Returns 200 with the elapsed time on success, 404 for an unknown id and
/// 500 when the job's action fails.
pub async fn trigger_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    trigger(&state, &id).await
}

/// GET /trigger-1h
pub async fn trigger_1h_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    trigger(&state, jobs::FUNCTION_1H).await
}

/// GET /trigger-2h
pub async fn trigger_2h_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    trigger(&state, jobs::FUNCTION_2H).await
}

async fn trigger(state: &AppState, id: &str) -> Result<Json<Value>, ApiError> {
    match state.invoker.invoke(id).await {
        Ok(report) => Ok(Json(json!({
            "message": format!("{} triggered manually", report.name),
            "status": "success",
            "job_id": report.id,
            "elapsed_ms": report.elapsed_ms(),
            "timestamp": timestamp(),
        }))),
        Err(e) => {
            error!(job_id = %id, "error triggering job: {e}");
            Err(api_error(format!("Error triggering {id}"), &e))
        }
    }
}
