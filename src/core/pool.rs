//! # Dispatch pool: admission control and worker fan-in.
//!
//! A fixed set of workers pulls job ids from one queue. Queue depth is bounded
//! by a semaphore of admission slots rather than by the channel, so a job that
//! is removed while queued gives its slot back at once.
//!
//! ```text
//! add_job ──► submit() ──try_acquire──► [ slots: Semaphore(max_queue_size) ]
//!               │  no permit → SubmitError::Rejected
//!               │  closed    → SubmitError::Stopped
//!               └─ register job (holds permit), send id ──► mpsc ──► Arc<Mutex<Receiver>>
//!                                                            ┌────────┼────────┐
//!                                                            ▼        ▼        ▼
//!                                                        worker 0  worker 1  worker N-1
//! ```
//!
//! ## Rules
//! - Submission never waits: a slot is taken with `try_acquire_owned` or the call fails.
//! - The permit lives in the registry entry and is released when the job
//!   starts or leaves the registry (removal, stop).
//! - The job is registered **before** its id is sent, so a worker always finds it;
//!   ids of jobs removed while queued are skipped on dequeue.
//! - No id is consumed and no job is registered for a rejected submission.
//! - Workers dequeue in FIFO order; one lock holder waits on `recv` at a time.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, TryAcquireError, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::scheduler::Shared;
use crate::core::worker::run_worker;
use crate::error::SubmitError;
use crate::jobs::{Job, JobId};

/// Shared consumer end of the dispatch channel.
pub(crate) type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<JobId>>>;

/// Bounded admission plus the worker set draining it.
pub(crate) struct DispatchPool {
    /// `None` once the pool stopped accepting work.
    tx: RwLock<Option<mpsc::UnboundedSender<JobId>>>,
    rx: JobQueue,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl DispatchPool {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: RwLock::new(Some(tx)),
            rx: Arc::new(Mutex::new(rx)),
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Spawns `workers` worker tasks into `set`.
    pub(crate) fn spawn_workers(
        &self,
        set: &mut JoinSet<()>,
        workers: usize,
        shared: &Arc<Shared>,
        token: &CancellationToken,
    ) {
        for index in 0..workers {
            set.spawn(run_worker(
                index,
                Arc::clone(&self.rx),
                Arc::clone(shared),
                token.clone(),
            ));
        }
    }

    /// Admits one job or fails fast.
    ///
    /// `register` runs only once a slot is taken; it must create the job and
    /// put it in the registry together with the slot.
    pub(crate) fn submit<F>(&self, register: F) -> Result<Job, SubmitError>
    where
        F: FnOnce(OwnedSemaphorePermit) -> Job,
    {
        let guard = self.tx.read();
        let tx = guard.as_ref().ok_or(SubmitError::Stopped)?;
        let slot = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => SubmitError::Rejected {
                    capacity: self.capacity,
                },
                TryAcquireError::Closed => SubmitError::Stopped,
            })?;

        let job = register(slot);
        if tx.send(job.id()).is_err() {
            // the receiver lives as long as the pool
            warn!(job_id = %job.id(), "dispatch channel closed; job will not run");
        }
        Ok(job)
    }

    /// Stops admission. Waits for in-progress `submit` calls to finish.
    ///
    /// Returns `false` if the pool was already closed.
    pub(crate) fn close(&self) -> bool {
        let was_open = self.tx.write().take().is_some();
        self.slots.close();
        was_open
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.read().is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }
}
