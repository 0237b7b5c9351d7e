use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};

use crate::{
    error::{Result, SchedulerError},
    registry::JobRegistry,
    types::InvocationReport,
};

/// Run a job's action right now, outside its schedule.
///
/// The definition is looked up in the registry, not the engine, so this
/// works whether or not the engine is running and ignores the job's
/// single-flight flag: a manual run may overlap a scheduled fire of the same
/// job. The caller waits for the action to finish and `next_run` is
/// untouched. The action gets its own task, as scheduled fires do, so a
/// panic comes back as [`SchedulerError::ActionFailed`].
pub async fn invoke(registry: &JobRegistry, job_id: &str) -> Result<InvocationReport> {
    let definition = registry
        .get(job_id)
        .ok_or_else(|| SchedulerError::UnknownJob {
            id: job_id.to_string(),
        })?;

    info!(job_id = %definition.id, name = %definition.name, "manual invocation");
    let started = Instant::now();
    let action = Arc::clone(&definition.action);
    let outcome = match tokio::spawn(async move { action.run().await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(anyhow::anyhow!("job panicked: {e}")),
        Err(e) => Err(anyhow::anyhow!("job cancelled: {e}")),
    };
    let elapsed = started.elapsed();

    match outcome {
        Ok(()) => {
            info!(job_id = %definition.id, elapsed_ms = elapsed.as_millis() as u64, "manual invocation completed");
            Ok(InvocationReport {
                id: definition.id.clone(),
                name: definition.name.clone(),
                elapsed,
            })
        }
        Err(source) => {
            error!(job_id = %definition.id, "manual invocation failed: {source:#}");
            Err(SchedulerError::ActionFailed {
                id: definition.id.clone(),
                source,
            })
        }
    }
}

/// Cloneable handle for manual invocations, holding the frozen registry.
#[derive(Clone)]
pub struct JobInvoker {
    registry: Arc<JobRegistry>,
}

impl JobInvoker {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub async fn invoke(&self, job_id: &str) -> Result<InvocationReport> {
        invoke(&self.registry, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobAction, JobDefinition};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn registry(counter: Arc<AtomicUsize>) -> JobRegistry {
        let mut reg = JobRegistry::new();
        reg.register(JobDefinition::from_fn(
            "ok",
            "Always succeeds",
            Duration::from_secs(60),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        ))
        .unwrap();
        reg.register(JobDefinition::from_fn(
            "broken",
            "Always fails",
            Duration::from_secs(60),
            || async { Err(anyhow::anyhow!("disk full")) },
        ))
        .unwrap();
        reg
    }

    #[tokio::test]
    async fn runs_registered_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let reg = registry(Arc::clone(&counter));
        let report = invoke(&reg, "ok").await.unwrap();
        assert_eq!(report.id, "ok");
        assert_eq!(report.name, "Always succeeds");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let reg = registry(Arc::clone(&counter));
        let err = invoke(&reg, "nope").await.unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownJob { ref id } if id == "nope"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn action_failure_wraps_cause() {
        let reg = registry(Arc::default());
        let err = invoke(&reg, "broken").await.unwrap_err();
        assert_eq!(err.code(), "ACTION_FAILED");
        assert_eq!(err.to_string(), "Job broken failed: disk full");
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "disk full");
    }

    struct Explodes;

    #[async_trait]
    impl JobAction for Explodes {
        async fn run(&self) -> anyhow::Result<()> {
            panic!("index out of range")
        }
    }

    #[tokio::test]
    async fn panicking_action_becomes_action_failed() {
        let mut reg = JobRegistry::new();
        reg.register(JobDefinition::new(
            "explodes",
            "Explodes",
            Duration::from_secs(60),
            Arc::new(Explodes),
        ))
        .unwrap();
        let invoker = JobInvoker::new(Arc::new(reg));

        // the panic must not take down the calling task
        let outcome = tokio::spawn(async move { invoker.invoke("explodes").await })
            .await
            .expect("caller task survives");
        let err = outcome.unwrap_err();
        assert_eq!(err.code(), "ACTION_FAILED");
        assert!(matches!(err, SchedulerError::ActionFailed { ref id, .. } if id == "explodes"));
        assert!(err.to_string().contains("job panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_covers_the_action() {
        let mut reg = JobRegistry::new();
        reg.register(JobDefinition::from_fn(
            "slow",
            "Slow",
            Duration::from_secs(60),
            || async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Ok(())
            },
        ))
        .unwrap();
        let invoker = JobInvoker::new(Arc::new(reg));
        let report = invoker.invoke("slow").await.unwrap();
        assert_eq!(report.elapsed_ms(), 250);
    }
}
