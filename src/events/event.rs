//! # Job lifecycle events delivered to listeners.
//!
//! Each transition a listener can observe produces one [`JobEvent`]:
//! - `Started`: worker picked the job up (`Queued → Running`)
//! - `Done` / `Failed`: invocation returned
//! - `TimedOut`: sweeper expired the run budget
//! - `Cancelled`: job removed by a caller, or scheduler stopped
//!
//! ## Ordering guarantees
//! Every event carries a process-wide monotonic `seq`; for a single job the
//! `Started` event always precedes its terminal event, whichever task
//! performed the terminal transition. If `stop` runs out of grace while a
//! `Started` delivery is stuck, that job's `Cancelled` event is dropped.
//!
//! ## Example
//! ```rust
//! use jobvisor::{JobEventKind, JobState};
//!
//! assert_eq!(JobEventKind::for_state(JobState::TimedOut), Some(JobEventKind::TimedOut));
//! assert_eq!(JobEventKind::for_state(JobState::Queued), None);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::jobs::{Job, JobState};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEventKind {
    /// Job started running.
    Started,
    /// Job finished with a result.
    Done,
    /// Job finished with a failure cause.
    Failed,
    /// Job was cancelled before finishing.
    Cancelled,
    /// Job exceeded its run budget.
    TimedOut,
}

impl JobEventKind {
    /// Event emitted on entering `state` (none for `Queued`).
    pub fn for_state(state: JobState) -> Option<Self> {
        match state {
            JobState::Queued => None,
            JobState::Running => Some(JobEventKind::Started),
            JobState::Done => Some(JobEventKind::Done),
            JobState::Failed => Some(JobEventKind::Failed),
            JobState::Cancelled => Some(JobEventKind::Cancelled),
            JobState::TimedOut => Some(JobEventKind::TimedOut),
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEventKind::Started)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobEventKind::Started => "started",
            JobEventKind::Done => "done",
            JobEventKind::Failed => "failed",
            JobEventKind::Cancelled => "cancelled",
            JobEventKind::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for JobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event with a snapshot of the job taken right after the transition.
#[derive(Clone, Debug)]
pub struct JobEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: JobEventKind,
    /// Job snapshot after the transition.
    pub job: Job,
}

impl JobEvent {
    /// Builds the event matching the job's current state, if that state is observable.
    pub fn from_job(job: Job) -> Option<Self> {
        let kind = JobEventKind::for_state(job.state())?;
        Some(Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobId, noop_target};
    use tokio::time::Instant;

    #[test]
    fn queued_jobs_produce_no_event() {
        let job = Job::new(JobId::next(), noop_target(), Instant::now());
        assert!(JobEvent::from_job(job).is_none());
    }

    #[test]
    fn sequence_numbers_increase() {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        job.start(now, None);
        let a = JobEvent::from_job(job.clone()).expect("running is observable");
        let b = JobEvent::from_job(job).expect("running is observable");
        assert_eq!(a.kind, JobEventKind::Started);
        assert!(!a.kind.is_terminal());
        assert!(b.seq > a.seq);
    }
}
