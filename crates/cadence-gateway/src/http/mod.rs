pub mod health;
pub mod jobs;
pub mod scheduler;

use axum::{http::StatusCode, Json};
use cadence_scheduler::SchedulerError;
use serde_json::{json, Value};

/// Error body shared by every endpoint: `{message, status: "error", error, code}`.
pub type ApiError = (StatusCode, Json<Value>);

/// HTTP status for a scheduler error.
pub fn status_for(err: &SchedulerError) -> StatusCode {
    match err {
        SchedulerError::UnknownJob { .. } => StatusCode::NOT_FOUND,
        SchedulerError::DuplicateId { .. } => StatusCode::CONFLICT,
        SchedulerError::InvalidInterval { .. } => StatusCode::BAD_REQUEST,
        SchedulerError::ActionFailed { .. } | SchedulerError::EngineState(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn api_error(message: impl Into<String>, err: &SchedulerError) -> ApiError {
    (
        status_for(err),
        Json(json!({
            "message": message.into(),
            "status": "error",
            "error": err.to_string(),
            "code": err.code(),
        })),
    )
}

/// Local wall-clock time in ISO-8601, used for response timestamps.
pub fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
