//! # LogListener: writes lifecycle events through `tracing`
//!
//! A minimal listener for demos and debugging.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO job lifecycle job_id=7 invoker="report.render" kind=started
//! INFO job lifecycle job_id=7 invoker="report.render" kind=done
//! WARN job lifecycle job_id=8 invoker="report.render" kind=failed error=invocation failed: db down
//! WARN job lifecycle job_id=9 invoker="export.csv" kind=timed_out
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ListenerError;
use crate::events::{JobEvent, JobEventKind};
use crate::listeners::JobListener;

/// Event writer listener.
#[derive(Default)]
pub struct LogListener;

impl LogListener {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobListener for LogListener {
    async fn on_event(&self, e: &JobEvent) -> Result<(), ListenerError> {
        let job_id = e.job.id();
        let invoker = e.job.target().name();
        match e.kind {
            JobEventKind::Started | JobEventKind::Done | JobEventKind::Cancelled => {
                info!(%job_id, invoker, kind = %e.kind, "job lifecycle");
            }
            JobEventKind::Failed => {
                let error = e.job.failure().map(ToString::to_string).unwrap_or_default();
                warn!(%job_id, invoker, kind = %e.kind, %error, "job lifecycle");
            }
            JobEventKind::TimedOut => {
                warn!(%job_id, invoker, kind = %e.kind, "job lifecycle");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogListener"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvocationError;
    use crate::jobs::{Job, JobId, noop_target};
    use tokio::time::Instant;

    #[tokio::test]
    async fn never_fails() {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        job.start(now, None);
        job.complete(Err(InvocationError::fail("db down")), now);
        let ev = JobEvent::from_job(job).expect("failed is observable");

        assert_eq!(LogListener::new().on_event(&ev).await, Ok(()));
    }
}
