use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job with this id is already registered.
    #[error("Duplicate job id: {id}")]
    DuplicateId { id: String },

    /// Intervals must be strictly positive.
    #[error("Invalid interval for job {id}: must be greater than zero")]
    InvalidInterval { id: String },

    /// No job with the given id is registered.
    #[error("Unknown job: {id}")]
    UnknownJob { id: String },

    /// The job's action returned an error during a manual invocation.
    #[error("Job {id} failed: {source}")]
    ActionFailed {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The engine could not change state (no runtime, loop task crashed).
    #[error("Scheduler engine error: {0}")]
    EngineState(String),
}

impl SchedulerError {
    /// Short error code string for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::DuplicateId { .. } => "DUPLICATE_ID",
            SchedulerError::InvalidInterval { .. } => "INVALID_INTERVAL",
            SchedulerError::UnknownJob { .. } => "UNKNOWN_JOB",
            SchedulerError::ActionFailed { .. } => "ACTION_FAILED",
            SchedulerError::EngineState(_) => "ENGINE_STATE",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
