use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::types::JobDefinition;

/// The set of job definitions known to the process.
///
/// Filled once at startup, then frozen behind an `Arc` and shared by the
/// engine and the manual invocation path. Iteration follows registration
/// order so listings are deterministic.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Arc<JobDefinition>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Rejects duplicate ids and zero intervals.
    pub fn register(&mut self, definition: JobDefinition) -> Result<()> {
        if definition.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval { id: definition.id });
        }
        if self.get(&definition.id).is_some() {
            return Err(SchedulerError::DuplicateId { id: definition.id });
        }
        debug!(
            job_id = %definition.id,
            name = %definition.name,
            interval_secs = definition.interval.as_secs(),
            "job registered"
        );
        self.jobs.push(Arc::new(definition));
        Ok(())
    }

    pub fn all(&self) -> &[Arc<JobDefinition>] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&Arc<JobDefinition>> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn noop(id: &str, secs: u64) -> JobDefinition {
        JobDefinition::from_fn(id, format!("job {id}"), Duration::from_secs(secs), || async {
            Ok(())
        })
    }

    #[test]
    fn keeps_registration_order() {
        let mut reg = JobRegistry::new();
        reg.register(noop("b", 5)).unwrap();
        reg.register(noop("a", 2)).unwrap();
        let ids: Vec<_> = reg.all().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn rejects_duplicate_id() {
        let mut reg = JobRegistry::new();
        reg.register(noop("a", 2)).unwrap();
        let err = reg.register(noop("a", 9)).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateId { ref id } if id == "a"));
        // the first registration wins
        assert_eq!(reg.get("a").unwrap().interval, Duration::from_secs(2));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rejects_zero_interval() {
        let mut reg = JobRegistry::new();
        let err = reg.register(noop("z", 0)).unwrap_err();
        assert_eq!(err.code(), "INVALID_INTERVAL");
        assert!(reg.is_empty());
    }

    #[test]
    fn get_unknown_is_none() {
        let reg = JobRegistry::new();
        assert!(reg.get("missing").is_none());
    }
}
