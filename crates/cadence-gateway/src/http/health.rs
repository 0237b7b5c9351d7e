use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /: basic service information.
pub async fn home_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": cadence_core::config::APP_DESCRIPTION,
        "status": "running",
        "scheduled_jobs": state.scheduler.job_count(),
    }))
}

/// GET /health: liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": super::timestamp(),
        "scheduler_running": state.scheduler.is_running(),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("CADENCE_GIT_SHA"),
    }))
}
