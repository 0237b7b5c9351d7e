//! Scheduler lifecycle endpoints.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use super::{api_error, timestamp, ApiError};
use crate::app::AppState;

/// GET /scheduler/status: running flag plus per-job detail.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = state.scheduler.status();
    Json(json!({
        "scheduler_running": status.running,
        "job_count": status.job_count,
        "jobs": status.jobs,
        "timestamp": timestamp(),
    }))
}

/// POST /scheduler/start: idempotent.
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    match state.scheduler.start() {
        Ok(_) => Ok(Json(json!({
            "message": "Scheduler started successfully",
            "status": "success",
            "scheduler_running": state.scheduler.is_running(),
        }))),
        Err(e) => {
            error!("Error starting scheduler: {e}");
            Err(api_error("Error starting scheduler", &e))
        }
    }
}

/// POST /scheduler/stop: idempotent; running jobs finish in the background.
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    match state.scheduler.stop().await {
        Ok(_) => Ok(Json(json!({
            "message": "Scheduler stopped successfully",
            "status": "success",
            "scheduler_running": state.scheduler.is_running(),
        }))),
        Err(e) => {
            error!("Error stopping scheduler: {e}");
            Err(api_error("Error stopping scheduler", &e))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::{call, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn start_stop_round_trip() {
        let state = test_state(Default::default());

        let (status, body) = call(&state, "POST", "/scheduler/start").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheduler_running"], true);

        // second start is a no-op
        let (status, body) = call(&state, "POST", "/scheduler/start").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheduler_running"], true);

        let (_, body) = call(&state, "GET", "/scheduler/status").await;
        assert_eq!(body["scheduler_running"], true);
        assert_eq!(body["job_count"], 2);
        assert!(body["jobs"][0]["next_run_time"].is_string());

        let (status, body) = call(&state, "POST", "/scheduler/stop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Scheduler stopped successfully");
        assert_eq!(body["scheduler_running"], false);

        let (status, body) = call(&state, "POST", "/scheduler/stop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheduler_running"], false);
    }

    #[tokio::test]
    async fn lifecycle_routes_reject_get() {
        let state = test_state(Default::default());
        let response_status = {
            use axum::body::Body;
            use axum::http::Request;
            use tower::ServiceExt;
            crate::app::build_router(state)
                .oneshot(
                    Request::builder()
                        .uri("/scheduler/start")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap()
                .status()
        };
        assert_eq!(response_status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
