use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Result, SchedulerError},
    registry::JobRegistry,
    schedule::{describe_interval, format_time, roll_forward, wall_clock},
    types::{JobDefinition, JobInfo, SchedulerStatus},
};

/// Runtime state of one job inside the engine.
struct ScheduledJob {
    definition: Arc<JobDefinition>,
    next_run: Instant,
    /// Single-flight guard for scheduled fires.
    executing: bool,
}

/// State shared between the engine handle, the loop task and fire tasks.
struct Shared {
    jobs: Mutex<Vec<ScheduledJob>>,
    /// Wakes the loop when the schedule changes outside of a fire.
    wake: Notify,
}

/// The background loop currently installed, if any.
struct Runner {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Interval-driven job engine.
///
/// Owns one background task that sleeps until the earliest `next_run`, fires
/// every due job on its own task and never runs two scheduled fires of the
/// same job at once. Cheap to share behind an `Arc`; every method takes
/// `&self`.
pub struct SchedulerEngine {
    shared: Arc<Shared>,
    runner: Mutex<Option<Runner>>,
}

impl SchedulerEngine {
    /// Create one scheduled instance per registered job, each due
    /// `now + interval`. The engine starts stopped.
    pub fn new(registry: &JobRegistry) -> Result<Self> {
        let now = Instant::now();
        let mut jobs: Vec<ScheduledJob> = Vec::with_capacity(registry.len());
        for definition in registry.all() {
            if jobs.iter().any(|j| j.definition.id == definition.id) {
                return Err(SchedulerError::DuplicateId {
                    id: definition.id.clone(),
                });
            }
            jobs.push(ScheduledJob {
                definition: Arc::clone(definition),
                next_run: now + definition.interval,
                executing: false,
            });
        }
        info!(count = jobs.len(), "scheduled jobs set up");

        Ok(Self {
            shared: Arc::new(Shared {
                jobs: Mutex::new(jobs),
                wake: Notify::new(),
            }),
            runner: Mutex::new(None),
        })
    }

    /// Start the evaluation loop on the current tokio runtime.
    ///
    /// Returns `Ok(false)` if it was already running. Jobs whose `next_run`
    /// passed while the engine was stopped are moved to their next boundary
    /// instead of firing in a burst.
    pub fn start(&self) -> Result<bool> {
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulerError::EngineState(format!("no tokio runtime: {e}")))?;

        let mut runner = self.runner();
        if let Some(current) = runner.as_ref() {
            if !current.handle.is_finished() {
                debug!("start requested but scheduler is already running");
                return Ok(false);
            }
            warn!("scheduler loop exited unexpectedly; starting a new one");
        }

        let count = {
            let now = Instant::now();
            let mut jobs = self.shared.jobs();
            for job in jobs.iter_mut().filter(|j| j.next_run <= now) {
                let (next, missed) = roll_forward(job.next_run, job.definition.interval, now);
                job.next_run = next;
                warn!(job_id = %job.definition.id, missed, "fires missed while stopped");
            }
            jobs.len()
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = rt.spawn(run_loop(Arc::clone(&self.shared), shutdown_rx));
        *runner = Some(Runner {
            shutdown_tx,
            handle,
        });
        info!(jobs = count, "scheduler started");
        Ok(true)
    }

    /// Stop the evaluation loop and wait for it to exit.
    ///
    /// In-flight actions keep running to completion on their own tasks; no
    /// new fire starts once this returns. Returns `Ok(false)` if it was
    /// already stopped.
    pub async fn stop(&self) -> Result<bool> {
        let runner = self.runner().take();
        let Some(runner) = runner else {
            debug!("stop requested but scheduler is not running");
            return Ok(false);
        };

        // A send error means the loop is already gone; the join below reports why.
        let _ = runner.shutdown_tx.send(true);
        runner
            .handle
            .await
            .map_err(|e| SchedulerError::EngineState(format!("scheduler loop failed: {e}")))?;
        info!("scheduler stopped");
        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.runner()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    pub fn job_count(&self) -> usize {
        self.shared.jobs().len()
    }

    /// Per-job status in registration order.
    pub fn jobs_info(&self) -> Vec<JobInfo> {
        self.jobs_info_with(self.is_running())
    }

    /// Engine-wide snapshot. The running flag is read once so it always
    /// agrees with the reported `next_run_time` values.
    pub fn status(&self) -> SchedulerStatus {
        let running = self.is_running();
        let jobs = self.jobs_info_with(running);
        SchedulerStatus {
            running,
            job_count: jobs.len(),
            jobs,
        }
    }

    fn jobs_info_with(&self, running: bool) -> Vec<JobInfo> {
        let now = Instant::now();
        let wall_now = Utc::now();
        self.shared
            .jobs()
            .iter()
            .map(|j| JobInfo {
                id: j.definition.id.clone(),
                name: j.definition.name.clone(),
                next_run_time: running.then(|| format_time(wall_clock(j.next_run, now, wall_now))),
                trigger: describe_interval(j.definition.interval),
                executing: j.executing,
            })
            .collect()
    }

    /// Monotonic deadline of the next scheduled fire for `id`.
    pub fn next_run(&self, id: &str) -> Option<Instant> {
        self.shared
            .jobs()
            .iter()
            .find(|j| j.definition.id == id)
            .map(|j| j.next_run)
    }

    /// Stop scheduling `id`. A fire already in progress is not interrupted.
    pub fn remove_job(&self, id: &str) -> Result<()> {
        {
            let mut jobs = self.shared.jobs();
            let before = jobs.len();
            jobs.retain(|j| j.definition.id != id);
            if jobs.len() == before {
                return Err(SchedulerError::UnknownJob { id: id.to_string() });
            }
        }
        self.shared.wake.notify_one();
        info!(job_id = %id, "job removed from schedule");
        Ok(())
    }

    fn runner(&self) -> MutexGuard<'_, Option<Runner>> {
        self.runner.lock().expect("scheduler runner poisoned")
    }
}

impl Shared {
    fn jobs(&self) -> MutexGuard<'_, Vec<ScheduledJob>> {
        self.jobs.lock().expect("scheduler state poisoned")
    }

    /// Fire every job due at `now` and return the earliest remaining deadline.
    fn fire_due(self: &Arc<Self>, now: Instant) -> Option<Instant> {
        let mut jobs = self.jobs();
        for job in jobs.iter_mut().filter(|j| j.next_run <= now) {
            let interval = job.definition.interval;
            let (next, steps) = roll_forward(job.next_run + interval, interval, now);
            job.next_run = next;
            if steps > 0 {
                warn!(job_id = %job.definition.id, missed = steps, "scheduler fell behind; missed fires coalesced");
            }

            if job.executing {
                warn!(job_id = %job.definition.id, "previous run still executing; fire skipped");
                continue;
            }
            job.executing = true;
            spawn_fire(Arc::clone(self), Arc::clone(&job.definition));
        }
        jobs.iter().map(|j| j.next_run).min()
    }

    /// Clear the single-flight flag once a fire has finished.
    fn finish(&self, id: &str) {
        if let Some(job) = self.jobs().iter_mut().find(|j| j.definition.id == id) {
            job.executing = false;
        }
    }
}

/// Run one scheduled fire on its own task.
///
/// The action gets a nested task so that a panic is observed as a
/// `JoinError` here and the single-flight flag is always released.
fn spawn_fire(shared: Arc<Shared>, definition: Arc<JobDefinition>) {
    tokio::spawn(async move {
        let started = Instant::now();
        debug!(job_id = %definition.id, name = %definition.name, "job fired");

        let action = Arc::clone(&definition.action);
        let outcome = tokio::spawn(async move { action.run().await }).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(())) => info!(job_id = %definition.id, elapsed_ms, "job completed"),
            Ok(Err(e)) => error!(job_id = %definition.id, elapsed_ms, "job failed: {e:#}"),
            Err(e) => error!(job_id = %definition.id, elapsed_ms, "job panicked: {e}"),
        }
        shared.finish(&definition.id);
    });
}

/// Main event loop. Sleeps until the next deadline until `shutdown` broadcasts `true`.
async fn run_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    info!("scheduler loop started");
    loop {
        let deadline = shared.fire_due(Instant::now());
        let sleep = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("scheduler loop shutting down");
                    break;
                }
            }
            _ = shared.wake.notified() => {}
            _ = sleep => {}
        }
    }
}
