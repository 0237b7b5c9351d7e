use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CadenceError, Result};

pub const APP_NAME: &str = "Cadence Scheduled Jobs";
pub const APP_DESCRIPTION: &str = "An HTTP-controlled service running interval-driven background jobs";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level config (cadence.toml + CADENCE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Per-job overrides keyed by job id, e.g. `[jobs.function_1h]`.
    #[serde(default)]
    pub jobs: BTreeMap<String, JobOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Start the scheduler when the process boots (default: true).
    /// Override with env var: CADENCE_SCHEDULER_ENABLED=false
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when RUST_LOG is unset: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit newline-delimited JSON instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOverride {
    /// Replaces the built-in interval for this job. Must be non-zero.
    pub interval_secs: Option<u64>,
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl CadenceConfig {
    /// Load config from a TOML file with CADENCE_* env var overrides.
    ///
    /// A missing file is not an error: every field has a default, so the
    /// service can run from env vars alone.
    ///
    /// Section keys split on `_` (`CADENCE_GATEWAY_PORT`). Job ids contain
    /// underscores themselves, so per-job overrides separate the id from the
    /// field with `__`: `CADENCE_JOBS_FUNCTION_1H__INTERVAL_SECS`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CadenceConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(
                Env::prefixed("CADENCE_")
                    .filter(|key| !key.starts_with("jobs_"))
                    .split("_"),
            )
            .merge(Env::prefixed("CADENCE_JOBS_").filter_map(|key| {
                let (id, field) = key.as_str().split_once("__")?;
                Some(format!("jobs.{id}.{field}").into())
            }))
            .extract()
            .map_err(|e| CadenceError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Socket address the HTTP gateway binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.gateway.bind, self.gateway.port)
            .parse()
            .map_err(|e| {
                CadenceError::Config(format!(
                    "invalid gateway address {}:{}: {e}",
                    self.gateway.bind, self.gateway.port
                ))
            })
    }

    /// Configured interval for `job_id`, if overridden. Zero is treated as unset.
    pub fn interval_override(&self, job_id: &str) -> Option<Duration> {
        self.jobs
            .get(job_id)
            .and_then(|o| o.interval_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Log the effective configuration, one field per line.
    pub fn log_summary(&self) {
        info!("Application configuration:");
        info!("  Gateway bind: {}", self.gateway.bind);
        info!("  Gateway port: {}", self.gateway.port);
        info!("  Scheduler enabled: {}", self.scheduler.enabled);
        info!("  Log level: {}", self.log.level);
        info!("  Log format: {}", if self.log.json { "json" } else { "text" });
        for (id, o) in &self.jobs {
            if let Some(secs) = o.interval_secs {
                info!("  Job override: {id} every {secs}s");
            }
        }
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cadence/cadence.toml", home)
}
