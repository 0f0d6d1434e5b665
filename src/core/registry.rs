//! # Job registry: bounded store of tracked jobs.
//!
//! The registry is the only structure mutated by several parties (callers,
//! workers, sweeper), so every mutation goes through one lock and every
//! transition is checked against the job's current state under that lock.
//!
//! ## Architecture
//! ```text
//! add_job ────► put(job, cancel, slot)    (evicts terminal jobs over capacity)
//! worker  ────► start(id) / complete(id)  (no-op if the job left or is terminal)
//! sweeper ────► expire_overdue(now) / purge_retained(now, retention)
//! callers ────► get(id) / list() / remove(id)
//! stop    ────► drain()
//! ```
//!
//! ## Rules
//! - Registry owns the authoritative [`Job`] and its cancellation token.
//! - Callers only ever get snapshots (clones).
//! - Capacity eviction picks the least-recently-completed terminal job
//!   (ties: lowest id); `Queued`/`Running` jobs are never evicted.
//! - A queued job holds its admission slot until it starts or leaves the registry.
//! - `start` locks the job's event gate before the lock is released; whoever
//!   publishes a terminal event for that job waits on the same gate, so
//!   `Started` always reaches listeners first.
//! - A write is visible to every later reader (single `RwLock`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::InvocationError;
use crate::jobs::{Job, JobId, JobState, JobValue, Target};

/// Per-job lock serializing event delivery.
pub(crate) type EventGate = Arc<Mutex<()>>;

/// Registry record: the job plus the token that cancels its invocation.
pub(crate) struct Entry {
    pub(crate) job: Job,
    pub(crate) cancel: CancellationToken,
    pub(crate) events: EventGate,
    /// Admission slot; released when the job leaves `Queued`.
    slot: Option<OwnedSemaphorePermit>,
}

/// What a worker needs to run a job it just moved to `Running`.
pub(crate) struct StartedJob {
    pub(crate) job: Job,
    pub(crate) target: Target,
    pub(crate) cancel: CancellationToken,
    /// Held until `Started` has been delivered.
    pub(crate) publishing: Option<OwnedMutexGuard<()>>,
}

/// Per-state resident job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub timed_out: usize,
}

impl SchedulerStats {
    /// Total resident jobs.
    pub fn resident(&self) -> usize {
        self.queued + self.running + self.done + self.failed + self.cancelled + self.timed_out
    }
}

/// Thread-safe `JobId → Job` store with capacity eviction.
pub(crate) struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Entry>>,
    max_cache_size: usize,
}

impl JobRegistry {
    pub(crate) fn new(max_cache_size: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_cache_size,
        }
    }

    /// Inserts `job`, evicting terminal jobs first if the store would exceed capacity.
    ///
    /// Returns the evicted ids. The insert succeeds even if nothing could be evicted.
    pub(crate) fn put(
        &self,
        job: Job,
        cancel: CancellationToken,
        slot: Option<OwnedSemaphorePermit>,
    ) -> Vec<JobId> {
        let mut jobs = self.jobs.write();
        let mut evicted = Vec::new();

        while jobs.len() >= self.max_cache_size {
            let Some(victim) = eviction_candidate(&jobs) else {
                break;
            };
            jobs.remove(&victim);
            evicted.push(victim);
        }
        if !evicted.is_empty() {
            debug!(?evicted, resident = jobs.len(), "evicted terminal jobs for capacity");
        }

        let entry = Entry {
            job,
            cancel,
            events: Arc::new(Mutex::new(())),
            slot,
        };
        jobs.insert(entry.job.id(), entry);
        evicted
    }

    pub(crate) fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.read().get(&id).map(|e| e.job.clone())
    }

    pub(crate) fn remove(&self, id: JobId) -> Option<Entry> {
        self.jobs.write().remove(&id)
    }

    /// Snapshot of all resident jobs, sorted by id.
    pub(crate) fn list(&self) -> Vec<Job> {
        let mut all: Vec<Job> = self.jobs.read().values().map(|e| e.job.clone()).collect();
        all.sort_unstable_by_key(Job::id);
        all
    }

    /// `Queued → Running`. Returns what the worker needs to execute, or `None`
    /// if the job was removed (or cancelled) while it sat in the queue.
    pub(crate) fn start(
        &self,
        id: JobId,
        now: Instant,
        timeout: Option<Duration>,
    ) -> Option<StartedJob> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(&id)?;
        if entry.job.state() != JobState::Queued {
            return None;
        }
        entry.job.start(now, timeout);
        drop(entry.slot.take());
        Some(StartedJob {
            job: entry.job.clone(),
            target: entry.job.target().clone(),
            cancel: entry.cancel.clone(),
            publishing: Arc::clone(&entry.events).try_lock_owned().ok(),
        })
    }

    /// `Running → Done | Failed`. Returns `None` for a late completion (job
    /// removed, timed out, or cancelled meanwhile); the outcome is discarded.
    pub(crate) fn complete(
        &self,
        id: JobId,
        outcome: Result<JobValue, InvocationError>,
        now: Instant,
    ) -> Option<Job> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(&id)?;
        if entry.job.state() != JobState::Running {
            return None;
        }
        entry.job.complete(outcome, now);
        Some(entry.job.clone())
    }

    /// Times out every running job whose deadline `now` has passed and fires
    /// its cancellation token. A job exactly at its deadline is not overdue yet.
    pub(crate) fn expire_overdue(&self, now: Instant) -> Vec<(Job, EventGate)> {
        let mut jobs = self.jobs.write();
        let mut expired = Vec::new();
        for entry in jobs.values_mut() {
            let overdue = entry.job.state() == JobState::Running
                && entry.job.timeout_at().is_some_and(|deadline| deadline < now);
            if overdue && entry.job.transition(JobState::TimedOut, now) {
                entry.cancel.cancel();
                expired.push((entry.job.clone(), Arc::clone(&entry.events)));
            }
        }
        expired.sort_unstable_by_key(|(job, _)| job.id());
        expired
    }

    /// Drops terminal jobs completed more than `retention` ago.
    pub(crate) fn purge_retained(&self, now: Instant, retention: Duration) -> Vec<JobId> {
        let mut jobs = self.jobs.write();
        let mut purged = Vec::new();
        jobs.retain(|id, entry| {
            let stale = entry
                .job
                .completed_at()
                .is_some_and(|done| done + retention <= now);
            if stale {
                purged.push(*id);
            }
            !stale
        });
        purged
    }

    /// Removes and returns every entry.
    pub(crate) fn drain(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.jobs.write().drain().map(|(_, e)| e).collect();
        entries.sort_unstable_by_key(|e| e.job.id());
        entries
    }

    pub(crate) fn stats(&self) -> SchedulerStats {
        let jobs = self.jobs.read();
        let mut stats = SchedulerStats::default();
        for entry in jobs.values() {
            match entry.job.state() {
                JobState::Queued => stats.queued += 1,
                JobState::Running => stats.running += 1,
                JobState::Done => stats.done += 1,
                JobState::Failed => stats.failed += 1,
                JobState::Cancelled => stats.cancelled += 1,
                JobState::TimedOut => stats.timed_out += 1,
            }
        }
        stats
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.read().len()
    }
}

/// Least-recently-completed terminal job, ties broken by lowest id.
fn eviction_candidate(jobs: &HashMap<JobId, Entry>) -> Option<JobId> {
    jobs.values()
        .filter_map(|e| e.job.completed_at().map(|at| (at, e.job.id())))
        .min()
        .map(|(_, id)| id)
}
