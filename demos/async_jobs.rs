//! # Example: async_jobs
//!
//! Submits a handful of jobs to a small scheduler and polls them to completion.
//!
//! Demonstrates how to:
//! - Wrap closures as targets with [`InvokeFn`] and bind arguments.
//! - Observe the lifecycle with [`LogListener`].
//! - See a saturated queue reject work, and a slow job time out.
//!
//! ## Flow
//! ```text
//! add_job ×5 ──► pool (2 workers, queue 2)
//!     ├─► 4 admitted, 1 Rejected
//!     ├─► "slow" overruns job_timeout ─► TimedOut
//!     └─► others ─► Done
//! stop()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example async_jobs
//! ```

use std::sync::Arc;
use std::time::Duration;

use jobvisor::{
    Arguments, InvocationError, InvokeFn, InvokeRef, JobValue, LogListener, Scheduler,
    SchedulerConfig, SubmitError, Target,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Small pool so the queue saturates quickly
    let cfg = SchedulerConfig {
        thread_pool_size: 2,
        max_queue_size: 2,
        job_timeout: Duration::from_millis(300),
        ..SchedulerConfig::default()
    };
    let sched = Scheduler::builder(cfg)
        .with_listener(Arc::new(LogListener::new()))
        .build();

    // 2. Targets
    let square: InvokeRef = InvokeFn::arc("square", |args: Arguments, _ctx: CancellationToken| async move {
        let n = args
            .get_as::<u64>(0)
            .copied()
            .ok_or_else(|| InvocationError::fail("expected a u64 argument"))?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, InvocationError>(JobValue::new(n * n))
    });
    let slow: InvokeRef = InvokeFn::arc("slow", |_args: Arguments, ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(5)) => Ok(JobValue::unit()),
            _ = ctx.cancelled() => Err(InvocationError::Canceled),
        }
    });

    // 3. Submit; the fifth call finds the queue full
    let mut ids = Vec::new();
    let targets = [
        Target::bare(slow),
        Target::new(square.clone(), Arguments::new().with(3_u64)),
        Target::new(square.clone(), Arguments::new().with(4_u64)),
        Target::new(square.clone(), Arguments::new().with(5_u64)),
        Target::new(square, Arguments::new().with(6_u64)),
    ];
    for target in targets {
        match sched.add_job(target) {
            Ok(job) => {
                println!("queued {} at {}", job.id(), sched.job_uri(job.id()));
                ids.push(job.id());
            }
            Err(e @ SubmitError::Rejected { .. }) => println!("rejected: {e}"),
            Err(e) => return Err(e.into()),
        }
        // let idle workers pick up what was just queued
        tokio::task::yield_now().await;
    }

    // 4. Poll until everything admitted is terminal
    while !ids
        .iter()
        .all(|id| sched.get_job(*id).is_some_and(|j| j.is_terminal()))
    {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for job in sched.get_all() {
        let value = job.result().and_then(|v| v.downcast_ref::<u64>());
        println!(
            "{} {:<8} {:<9} result={value:?} failure={:?}",
            job.id(),
            job.target().name(),
            job.state(),
            job.failure()
        );
    }
    println!("{:?}", sched.stats());

    sched.stop().await?;
    Ok(())
}
