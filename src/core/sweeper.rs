//! # Timeout sweeper.
//!
//! Periodic background task that enforces time bounds on the registry:
//! - `Running` jobs past their deadline become `TimedOut` and their token fires
//!   (`TimedOut` is published after the job's `Started`);
//! - terminal jobs older than the retention window are dropped (if enabled).
//!
//! ```text
//! interval(sweep_every) ──tick──► sweep(now)
//!                                   ├─► registry.expire_overdue(now) ─► notify TimedOut (each)
//!                                   └─► registry.purge_retained(now)  (debug! only)
//! ```
//!
//! A job that overruns is therefore observed as `TimedOut` at most one sweep
//! interval after its deadline, whether or not the invocation ever returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::scheduler::Shared;

/// What one sweep changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepReport {
    pub(crate) timed_out: usize,
    pub(crate) purged: usize,
}

/// Runs `sweep` every `every` until `token` is cancelled.
pub(crate) async fn run_sweeper(shared: Arc<Shared>, every: Duration, token: CancellationToken) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let report = sweep(&shared, Instant::now()).await;
                if report != SweepReport::default() {
                    trace!(timed_out = report.timed_out, purged = report.purged, "sweep");
                }
            }
        }
    }
    debug!("sweeper exited");
}

/// One pass over the registry.
pub(crate) async fn sweep(shared: &Shared, now: Instant) -> SweepReport {
    let expired = shared.registry.expire_overdue(now);
    let timed_out = expired.len();
    for (job, events) in expired {
        debug!(job_id = %job.id(), "job timed out");
        shared.publish_after(&events, job).await;
    }

    let purged = match shared.cfg.retention() {
        Some(retention) => {
            let ids = shared.registry.purge_retained(now, retention);
            if !ids.is_empty() {
                debug!(?ids, "purged terminal jobs past retention");
            }
            ids.len()
        }
        None => 0,
    };

    SweepReport { timed_out, purged }
}
