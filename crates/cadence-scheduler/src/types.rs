use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// The business logic a job runs when it fires.
///
/// Implementations must eventually return; the engine imposes no timeout.
/// An `Err` is logged for scheduled fires and surfaced to the caller for
/// manual invocations.
#[async_trait]
pub trait JobAction: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`JobAction`].
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F, Fut> JobAction for FnAction<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}

/// Immutable description of a recurring job.
///
/// Once registered the definition is shared behind an `Arc` and never
/// mutated; changing the interval or action means registering a new id.
#[derive(Clone)]
pub struct JobDefinition {
    /// Stable unique key, e.g. `function_1h`.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub description: Option<String>,
    /// Fixed time between fires. Must be non-zero.
    pub interval: Duration,
    pub action: Arc<dyn JobAction>,
}

impl JobDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        interval: Duration,
        action: Arc<dyn JobAction>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            interval,
            action,
        }
    }

    /// Build a definition whose action is an async closure.
    pub fn from_fn<F, Fut>(
        id: impl Into<String>,
        name: impl Into<String>,
        interval: Duration,
        f: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(id, name, interval, Arc::new(FnAction(f)))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Status projection of one scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    /// RFC 3339 timestamp of the next planned fire; `None` while the engine is stopped.
    pub next_run_time: Option<String>,
    /// Human-readable trigger, e.g. `interval[1:00:00]`.
    pub trigger: String,
    /// Whether a scheduled fire of this job is in progress.
    pub executing: bool,
}

/// One-shot snapshot of the whole engine.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub job_count: usize,
    pub jobs: Vec<JobInfo>,
}

/// Outcome of a successful manual invocation.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub id: String,
    pub name: String,
    pub elapsed: Duration,
}

impl InvocationReport {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_info_wire_shape() {
        let info = JobInfo {
            id: "function_1h".to_string(),
            name: "Function every 1 hour".to_string(),
            next_run_time: None,
            trigger: "interval[1:00:00]".to_string(),
            executing: false,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "function_1h");
        assert_eq!(json["trigger"], "interval[1:00:00]");
        // a stopped engine reports null rather than omitting the field
        assert!(json["next_run_time"].is_null());
        assert!(json.as_object().unwrap().contains_key("next_run_time"));
    }

    #[test]
    fn debug_omits_action() {
        let def = JobDefinition::from_fn("a", "A", Duration::from_secs(1), || async { Ok(()) })
            .with_description("does a");
        let dbg = format!("{def:?}");
        assert!(dbg.contains("\"a\""));
        assert!(dbg.contains("does a"));
        assert!(!dbg.contains("action"));
    }
}
