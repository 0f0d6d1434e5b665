//! # Pool worker: executes one job at a time.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► lock queue, recv id (cancellable)     None → exit
//!   ├─► registry.start(id)                    None → skip (removed while queued)
//!   ├─► notify Started (job's event gate held)
//!   ├─► select! {
//!   │     invocation (panic caught) ─► registry.complete(id, outcome)
//!   │                                   ├─ Some(job) → notify Done/Failed
//!   │                                   └─ None      → late completion, discard
//!   │     job token cancelled ─────────► drop invocation (timeout/remove/stop)
//!   │   }
//! }
//! ```
//!
//! ## Rules
//! - A panicking invocation is recorded as [`InvocationError::Panicked`]; the worker survives.
//! - The invocation future is dropped as soon as the job's token fires; the
//!   party that fired it owns the terminal transition and its notification.
//! - Listener fan-out runs on this worker, in completion order.
//! - `Started` is delivered while the job's event gate is held, so a terminal
//!   event from `remove_job`, `stop` or the sweeper can never overtake it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::select;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::pool::JobQueue;
use crate::core::registry::StartedJob;
use crate::core::scheduler::Shared;
use crate::error::{InvocationError, describe_panic};
use crate::jobs::JobId;

/// Runs until the queue closes or `token` is cancelled.
pub(crate) async fn run_worker(
    index: usize,
    queue: JobQueue,
    shared: Arc<Shared>,
    token: CancellationToken,
) {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            select! {
                biased;
                _ = token.cancelled() => None,
                id = rx.recv() => id,
            }
        };
        let Some(id) = next else {
            break;
        };
        execute(&shared, id).await;
    }
    debug!(worker = index, "worker exited");
}

/// Executes one dequeued job.
async fn execute(shared: &Shared, id: JobId) {
    let Some(StartedJob {
        job,
        target,
        cancel,
        publishing,
    }) = shared.registry.start(id, Instant::now(), shared.cfg.timeout())
    else {
        debug!(job_id = %id, "job left the registry before it could start");
        return;
    };
    debug!(job_id = %id, invoker = target.name(), "job started");
    shared.publish(job).await;
    drop(publishing);

    let ctx = cancel.clone();
    let invocation = AssertUnwindSafe(async move { target.invoke(ctx).await }).catch_unwind();

    let outcome = select! {
        res = invocation => match res {
            Ok(outcome) => outcome,
            Err(panic) => Err(InvocationError::Panicked {
                info: describe_panic(panic.as_ref()),
            }),
        },
        _ = cancel.cancelled() => {
            debug!(job_id = %id, "invocation dropped after cancellation");
            return;
        }
    };

    match shared.registry.complete(id, outcome, Instant::now()) {
        Some(job) => {
            debug!(job_id = %id, state = %job.state(), "job completed");
            shared.publish(job).await;
        }
        None => debug!(job_id = %id, "discarding late completion"),
    }
}
