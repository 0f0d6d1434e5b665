//! # Scheduler: the public entry point.
//!
//! The [`Scheduler`] exclusively owns its registry, dispatch pool, sweeper and
//! listener bus. Nothing is global except the id and event sequence counters,
//! so several schedulers can coexist in one process.
//!
//! ## Key responsibilities
//! - admit jobs through the bounded [`DispatchPool`] (fail fast on saturation)
//! - expose point-in-time job snapshots by id or in bulk
//! - cancel jobs on removal and on [`Scheduler::stop`]
//! - manage lifecycle listeners
//!
//! ## High-level architecture
//! ```text
//! add_job(target) ──► DispatchPool::submit ──► JobRegistry::put ──► queue
//!                                                                     │
//!                     ┌───────────────────────────────────────────────┘
//!                     ▼
//!               worker 0..N ──► Target::invoke(ctx) ──► JobRegistry::complete
//!                     │                                         │
//!                     └──────────────► ListenerBus::notify ◄────┘
//!                                           ▲
//!  sweeper (interval) ─► expire_overdue ────┘
//!
//! Shutdown path (stop), all within one grace deadline:
//!   pool.close()               → further add_job fail with Stopped
//!   runtime_token.cancel()     → workers and sweeper exit, in-flight invocations dropped
//!   registry.drain()           → non-terminal jobs become Cancelled (listeners notified)
//!   join workers               → RuntimeError::GraceExceeded if they overrun
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::builder::SchedulerBuilder;
use crate::core::config::SchedulerConfig;
use crate::core::pool::DispatchPool;
use crate::core::registry::{Entry, EventGate, JobRegistry, SchedulerStats};
use crate::error::{RuntimeError, SubmitError};
use crate::events::JobEvent;
use crate::jobs::{Job, JobId, JobState, Target};
use crate::listeners::{ListenerBus, ListenerRef};

/// State shared between the facade, the workers and the sweeper.
pub(crate) struct Shared {
    pub(crate) cfg: SchedulerConfig,
    pub(crate) registry: JobRegistry,
    pub(crate) listeners: ListenerBus,
}

impl Shared {
    pub(crate) fn new(cfg: SchedulerConfig) -> Self {
        Self {
            registry: JobRegistry::new(cfg.max_cache_size),
            listeners: ListenerBus::new(),
            cfg,
        }
    }

    /// Notifies listeners of the job's current state (no-op for `Queued`).
    pub(crate) async fn publish(&self, job: Job) {
        if let Some(event) = JobEvent::from_job(job) {
            self.listeners.notify(&event).await;
        }
    }

    /// Publishes a terminal transition made outside the worker, after any
    /// in-flight `Started` delivery for the same job.
    pub(crate) async fn publish_after(&self, gate: &EventGate, job: Job) {
        let _order = gate.lock().await;
        self.publish(job).await;
    }
}

/// Asynchronous invocation scheduler.
///
/// Must be built inside a tokio runtime (workers and the sweeper are spawned on it).
pub struct Scheduler {
    shared: Arc<Shared>,
    pool: DispatchPool,
    runtime_token: CancellationToken,
    tasks: Mutex<Option<JoinSet<()>>>,
}

impl Scheduler {
    /// Returns a builder for a scheduler with the given configuration.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    /// Builds a scheduler without initial listeners.
    pub fn new(cfg: SchedulerConfig) -> Self {
        SchedulerBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(
        shared: Arc<Shared>,
        pool: DispatchPool,
        runtime_token: CancellationToken,
        tasks: JoinSet<()>,
    ) -> Self {
        Self {
            shared,
            pool,
            runtime_token,
            tasks: Mutex::new(Some(tasks)),
        }
    }

    /// Submits `target` for asynchronous execution.
    ///
    /// Never waits: returns the `Queued` job immediately, or
    /// [`SubmitError::Rejected`] when the admission queue is saturated, or
    /// [`SubmitError::Stopped`] after [`Scheduler::stop`].
    pub fn add_job(&self, target: Target) -> Result<Job, SubmitError> {
        let job = self
            .pool
            .submit(|slot| {
                let job = Job::new(JobId::next(), target, Instant::now());
                self.shared
                    .registry
                    .put(job.clone(), self.runtime_token.child_token(), Some(slot));
                job
            })
            .inspect_err(|e| debug!(error = %e, "submission refused"))?;

        debug!(job_id = %job.id(), invoker = job.target().name(), "job queued");
        Ok(job)
    }

    /// Returns a snapshot of the job, or `None` if unknown, removed or evicted.
    pub fn get_job(&self, id: JobId) -> Option<Job> {
        self.shared.registry.get(id)
    }

    /// Removes the job and returns its final snapshot.
    ///
    /// A `Queued` or `Running` job is cancelled first (its token fires and
    /// listeners observe `Cancelled`); a late result from its worker is discarded.
    /// A queued job gives its admission slot back immediately.
    pub async fn remove_job(&self, id: JobId) -> Option<Job> {
        let Entry {
            mut job,
            cancel,
            events,
            ..
        } = self.shared.registry.remove(id)?;
        if !job.is_terminal() {
            cancel.cancel();
            job.transition(JobState::Cancelled, Instant::now());
            debug!(job_id = %id, "job cancelled by removal");
            self.shared.publish_after(&events, job.clone()).await;
        }
        Some(job)
    }

    /// Snapshot of every resident job, sorted by id.
    pub fn get_all(&self) -> Vec<Job> {
        self.shared.registry.list()
    }

    /// Registers a listener; `false` if this instance is already registered.
    pub fn register_listener(&self, listener: ListenerRef) -> bool {
        self.shared.listeners.register(listener)
    }

    /// Unregisters a listener; `false` if it was not registered.
    pub fn unregister_listener(&self, listener: &ListenerRef) -> bool {
        self.shared.listeners.unregister(listener)
    }

    /// Per-state counts of resident jobs.
    pub fn stats(&self) -> SchedulerStats {
        self.shared.registry.stats()
    }

    /// Route where a transport exposes the job: `{async_service_path}/{id}`.
    pub fn job_uri(&self, id: JobId) -> String {
        format!(
            "{}/{}",
            self.shared.cfg.async_service_path.trim_end_matches('/'),
            id
        )
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.cfg
    }

    /// Route prefix used by [`Scheduler::job_uri`].
    pub fn async_service_path(&self) -> &str {
        &self.shared.cfg.async_service_path
    }

    /// Resident job count above which terminal jobs are evicted.
    pub fn max_cache_size(&self) -> usize {
        self.shared.cfg.max_cache_size
    }

    /// Effective admission queue capacity.
    pub fn max_queue_size(&self) -> usize {
        self.pool.capacity()
    }

    /// Effective worker count.
    pub fn thread_pool_size(&self) -> usize {
        self.shared.cfg.workers()
    }

    /// Configured run budget (`0s` = none).
    pub fn job_timeout(&self) -> Duration {
        self.shared.cfg.job_timeout
    }

    /// True once [`Scheduler::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.pool.is_closed()
    }

    /// Stops the scheduler.
    ///
    /// Closes admission, cancels in-flight jobs (listeners observe `Cancelled`),
    /// discards the registry and joins workers and the sweeper. The whole stop is
    /// bounded by [`SchedulerConfig::grace`]; a `Cancelled` event still waiting
    /// behind a stalled `Started` delivery at the deadline is dropped.
    /// Idempotent: later calls return `Ok(())`.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        if !self.pool.close() {
            return Ok(());
        }
        info!("scheduler stopping");
        let deadline = Instant::now() + self.shared.cfg.grace;
        self.runtime_token.cancel();

        let now = Instant::now();
        let cancelled: Vec<(Job, EventGate)> = self
            .shared
            .registry
            .drain()
            .into_iter()
            .filter_map(|Entry { mut job, cancel, events, .. }| {
                if job.is_terminal() {
                    return None;
                }
                cancel.cancel();
                job.transition(JobState::Cancelled, now);
                Some((job, events))
            })
            .collect();
        for (job, events) in cancelled {
            let id = job.id();
            let delivered = time::timeout_at(deadline, self.shared.publish_after(&events, job)).await;
            if delivered.is_err() {
                warn!(job_id = %id, "stop grace ran out before Cancelled was delivered");
            }
        }

        let tasks = self.tasks.lock().take();
        match tasks {
            Some(set) => self.join_until(set, deadline).await,
            None => Ok(()),
        }
    }

    /// Waits for background tasks until `deadline`; aborts stragglers.
    async fn join_until(&self, mut set: JoinSet<()>, deadline: Instant) -> Result<(), RuntimeError> {
        let grace = self.shared.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match time::timeout_at(deadline, done).await {
            Ok(()) => {
                info!("scheduler stopped");
                Ok(())
            }
            Err(_) => {
                let stuck = set.len();
                set.abort_all();
                warn!(?grace, stuck, "scheduler stop exceeded grace; aborting");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
