use axum::{
    routing::{get, post},
    Router,
};
use cadence_core::CadenceConfig;
use cadence_scheduler::{JobInvoker, SchedulerEngine};
use std::sync::Arc;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: CadenceConfig,
    /// Trigger engine; lifecycle and status calls go straight to it.
    pub scheduler: SchedulerEngine,
    /// Manual invocation path over the frozen job registry.
    pub invoker: JobInvoker,
}

impl AppState {
    pub fn new(config: CadenceConfig, scheduler: SchedulerEngine, invoker: JobInvoker) -> Self {
        Self {
            config,
            scheduler,
            invoker,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::http::{health, jobs, scheduler};

    Router::new()
        .route("/", get(health::home_handler))
        .route("/health", get(health::health_handler))
        .route("/jobs", get(jobs::list_handler))
        .route("/jobs/{id}/trigger", post(jobs::trigger_handler))
        .route("/trigger-1h", get(jobs::trigger_1h_handler))
        .route("/trigger-2h", get(jobs::trigger_2h_handler))
        .route("/scheduler/status", get(scheduler::status_handler))
        .route("/scheduler/start", post(scheduler::start_handler))
        .route("/scheduler/stop", post(scheduler::stop_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use cadence_scheduler::{JobDefinition, JobRegistry};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    /// App with two jobs: `counter` (increments `hits`) and `broken` (always fails).
    pub fn test_state(hits: Arc<AtomicUsize>) -> Arc<AppState> {
        let mut registry = JobRegistry::new();
        registry
            .register(JobDefinition::from_fn(
                "counter",
                "Counter",
                Duration::from_secs(3_600),
                move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            ))
            .unwrap();
        registry
            .register(JobDefinition::from_fn(
                "broken",
                "Broken",
                Duration::from_secs(7_200),
                || async { Err(anyhow::anyhow!("database unreachable")) },
            ))
            .unwrap();
        state_for(registry)
    }

    /// App over an arbitrary registry, scheduler stopped.
    pub fn state_for(registry: JobRegistry) -> Arc<AppState> {
        let registry = Arc::new(registry);
        let scheduler = SchedulerEngine::new(&registry).unwrap();
        Arc::new(AppState::new(
            CadenceConfig::default(),
            scheduler,
            JobInvoker::new(registry),
        ))
    }

    /// Send one request through the router and decode the JSON body.
    pub async fn call(state: &Arc<AppState>, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = build_router(Arc::clone(state))
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
