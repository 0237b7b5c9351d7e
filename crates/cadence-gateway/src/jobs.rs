//! Built-in jobs and their business logic.
//!
//! The scheduler treats these as opaque actions; everything job-specific
//! lives here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::CadenceConfig;
use cadence_scheduler::{JobAction, JobDefinition, JobRegistry};
use tracing::info;

pub const FUNCTION_1H: &str = "function_1h";
pub const FUNCTION_2H: &str = "function_2h";

const HOUR: Duration = Duration::from_secs(3_600);

/// Logs the local time it ran at. Placeholder for real business logic
/// (data processing, cleanup, reports).
struct TimestampTask {
    label: &'static str,
}

#[async_trait]
impl JobAction for TimestampTask {
    async fn run(&self) -> anyhow::Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        info!("Function every {} executed at: {now}", self.label);
        Ok(())
    }
}

/// Register every built-in job, applying `[jobs.<id>]` interval overrides.
pub fn build_registry(config: &CadenceConfig) -> cadence_scheduler::Result<JobRegistry> {
    let mut registry = JobRegistry::new();

    registry.register(
        JobDefinition::new(
            FUNCTION_1H,
            "Function every 1 hour",
            config.interval_override(FUNCTION_1H).unwrap_or(HOUR),
            Arc::new(TimestampTask { label: "1h" }),
        )
        .with_description("Executes business logic every 1 hour"),
    )?;

    registry.register(
        JobDefinition::new(
            FUNCTION_2H,
            "Function every 2 hours",
            config.interval_override(FUNCTION_2H).unwrap_or(2 * HOUR),
            Arc::new(TimestampTask { label: "2h" }),
        )
        .with_description("Executes business logic every 2 hours"),
    )?;

    info!("Set up {} scheduled jobs", registry.len());
    Ok(registry)
}
