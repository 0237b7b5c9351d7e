use std::sync::Arc;

use cadence_core::config::{CadenceConfig, LogConfig, APP_DESCRIPTION, APP_NAME};
use cadence_scheduler::{JobInvoker, SchedulerEngine};
use clap::Parser;
use tracing::{error, info, warn};

mod app;
mod http;
mod jobs;

#[derive(Debug, Parser)]
#[command(name = "cadence-gateway", version, about = APP_DESCRIPTION)]
struct Cli {
    /// Path to cadence.toml (default: ~/.cadence/cadence.toml).
    #[arg(long, env = "CADENCE_CONFIG")]
    config: Option<String>,

    /// Override gateway.bind.
    #[arg(long)]
    bind: Option<String>,

    /// Override gateway.port.
    #[arg(long)]
    port: Option<u16>,

    /// Do not start the scheduler at boot (it can still be started over HTTP).
    #[arg(long)]
    no_scheduler: bool,
}

impl Cli {
    fn apply(&self, config: &mut CadenceConfig) {
        if let Some(ref bind) = self.bind {
            config.gateway.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if self.no_scheduler {
            config.scheduler.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // load config: --config > CADENCE_CONFIG env > ~/.cadence/cadence.toml
    let (mut config, load_error) = match CadenceConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (CadenceConfig::default(), Some(e)),
    };
    cli.apply(&mut config);

    init_tracing(&config.log);
    if let Some(e) = load_error {
        warn!("Config load failed ({}), using defaults", e);
    }

    // jobs → registry (frozen) → engine; the registry is shared, never global
    let registry = Arc::new(jobs::build_registry(&config)?);
    let scheduler = SchedulerEngine::new(&registry)?;
    let invoker = JobInvoker::new(Arc::clone(&registry));

    let addr = config.listen_addr()?;
    let state = Arc::new(app::AppState::new(config, scheduler, invoker));

    if state.config.scheduler.enabled {
        state.scheduler.start()?;
        info!("Scheduler started successfully");
    } else {
        info!("Scheduler disabled by configuration");
    }
    log_startup_info(&state);

    let router = app::build_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Cadence gateway listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // in-flight jobs keep running on their own tasks until the runtime exits
    state.scheduler.stop().await?;
    info!("Cadence gateway stopped");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `log.level` applies to the cadence crates.
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "cadence_gateway={0},cadence_scheduler={0},cadence_core={0},tower_http=info",
            log.level
        )
        .into()
    });

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn log_startup_info(state: &app::AppState) {
    let rule = "=".repeat(50);
    info!("{rule}");
    info!(
        "Starting {} v{} ({})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("CADENCE_GIT_SHA")
    );
    info!("{rule}");

    state.config.log_summary();

    info!("Scheduled jobs: {}", state.scheduler.job_count());
    for job in state.scheduler.jobs_info() {
        info!(
            "  Job: {} ({}) - Next run: {}",
            job.name,
            job.trigger,
            job.next_run_time.as_deref().unwrap_or("not scheduled")
        );
    }
    info!("{rule}");
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "cadence-gateway",
            "--port",
            "8081",
            "--bind",
            "127.0.0.1",
            "--no-scheduler",
        ]);
        let mut config = CadenceConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.gateway.port, 8081);
        assert_eq!(config.gateway.bind, "127.0.0.1");
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["cadence-gateway"]);
        let mut config = CadenceConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.gateway.port, 5000);
        assert!(config.scheduler.enabled);
    }
}
