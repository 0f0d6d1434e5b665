//! # Job: tracked state of one asynchronous invocation.
//!
//! A [`Job`] is pure bookkeeping. It is created `Queued` on admission and walks
//! the state machine below; terminal states are immutable.
//!
//! ```text
//!            ┌──────────► Cancelled ◄──────────┐
//!            │                                 │
//!         Queued ──────────► Running ──────────┼──► Done
//!                                              ├──► Failed
//!                                              └──► TimedOut
//! ```
//!
//! ## Rules
//! - `result` is set only in `Done`, `failure` only in `Failed`.
//! - Ids are process-unique and strictly increasing (never reused).
//! - Illegal transitions panic in debug builds and are ignored otherwise.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::InvocationError;
use crate::jobs::target::Target;
use crate::jobs::value::JobValue;

/// Process-wide id counter (shared by every scheduler instance).
static JOB_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn next() -> Self {
        Self(JOB_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Admitted, waiting in the queue.
    Queued,
    /// Picked up by a worker.
    Running,
    /// Target returned a value.
    Done,
    /// Target returned an error or panicked.
    Failed,
    /// Removed by a caller (or scheduler stop) before completion.
    Cancelled,
    /// Exceeded its run budget.
    TimedOut,
}

impl JobState {
    /// True for `Done`, `Failed`, `Cancelled`, `TimedOut`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Queued | JobState::Running)
    }

    /// True if `self → next` is an edge of the state machine.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Done)
                | (Running, Failed)
                | (Running, TimedOut)
                | (Running, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Done => "done",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
            JobState::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Snapshot of one asynchronous invocation.
///
/// Values handed out by the scheduler are point-in-time copies; the authoritative
/// record lives in the registry.
#[derive(Clone, Debug)]
pub struct Job {
    id: JobId,
    state: JobState,
    target: Target,
    result: Option<JobValue>,
    failure: Option<InvocationError>,
    submitted_at: Instant,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
    timeout_at: Option<Instant>,
}

impl Job {
    pub(crate) fn new(id: JobId, target: Target, now: Instant) -> Self {
        Self {
            id,
            state: JobState::Queued,
            target,
            result: None,
            failure: None,
            submitted_at: now,
            started_at: None,
            completed_at: None,
            timeout_at: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Return value; present only in [`JobState::Done`].
    pub fn result(&self) -> Option<&JobValue> {
        self.result.as_ref()
    }

    /// Failure cause; present only in [`JobState::Failed`].
    pub fn failure(&self) -> Option<&InvocationError> {
        self.failure.as_ref()
    }

    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Instant> {
        self.completed_at
    }

    /// Deadline of the run budget; set when the job starts running (if a timeout is configured).
    pub fn timeout_at(&self) -> Option<Instant> {
        self.timeout_at
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Moves to `next`, stamping the matching timestamp.
    ///
    /// Returns `false` (and panics in debug builds) on an illegal edge.
    pub(crate) fn transition(&mut self, next: JobState, now: Instant) -> bool {
        let legal = self.state.can_transition_to(next);
        debug_assert!(
            legal,
            "illegal job transition {} -> {} (job {})",
            self.state, next, self.id
        );
        if !legal {
            return false;
        }
        self.state = next;
        if next == JobState::Running {
            self.started_at = Some(now);
        } else if next.is_terminal() {
            self.completed_at = Some(now);
        }
        true
    }

    /// `Queued → Running`; computes the deadline from `timeout`.
    pub(crate) fn start(&mut self, now: Instant, timeout: Option<Duration>) -> bool {
        if !self.transition(JobState::Running, now) {
            return false;
        }
        self.timeout_at = timeout.map(|t| now + t);
        true
    }

    /// `Running → Done | Failed` depending on the invocation outcome.
    pub(crate) fn complete(
        &mut self,
        outcome: Result<JobValue, InvocationError>,
        now: Instant,
    ) -> bool {
        match outcome {
            Ok(value) => {
                if !self.transition(JobState::Done, now) {
                    return false;
                }
                self.result = Some(value);
            }
            Err(err) => {
                if !self.transition(JobState::Failed, now) {
                    return false;
                }
                self.failure = Some(err);
            }
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::jobs::target::{InvokeFn, InvokeRef};
    use crate::jobs::value::Arguments;
    use tokio_util::sync::CancellationToken;

    pub(crate) fn noop_target() -> Target {
        let t: InvokeRef = InvokeFn::arc("noop", |_a: Arguments, _c: CancellationToken| async {
            Ok(JobValue::unit())
        });
        Target::bare(t)
    }

    #[test]
    fn ids_strictly_increase() {
        let a = JobId::next();
        let b = JobId::next();
        assert!(b > a);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use JobState::*;
        let all = [Queued, Running, Done, Failed, Cancelled, TimedOut];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
        assert!(Queued.can_transition_to(Cancelled));
        assert!(!Queued.can_transition_to(Done));
        assert!(!Queued.can_transition_to(TimedOut));
    }

    #[test]
    fn success_path_sets_result_only() {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        assert!(job.start(now, Some(Duration::from_secs(2))));
        assert_eq!(job.timeout_at(), Some(now + Duration::from_secs(2)));
        assert!(job.result().is_none() && job.failure().is_none());

        assert!(job.complete(Ok(JobValue::new(5_u8)), now));
        assert_eq!(job.state(), JobState::Done);
        assert_eq!(job.result().and_then(|v| v.downcast_ref::<u8>()), Some(&5));
        assert!(job.failure().is_none());
        assert_eq!(job.completed_at(), Some(now));
    }

    #[test]
    fn failure_path_sets_cause_only() {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        job.start(now, None);
        assert!(job.timeout_at().is_none());

        assert!(job.complete(Err(InvocationError::fail("db down")), now));
        assert_eq!(job.state(), JobState::Failed);
        assert!(job.result().is_none());
        assert_eq!(job.failure(), Some(&InvocationError::fail("db down")));
    }

    #[test]
    fn cancelled_and_timed_out_carry_neither() {
        let now = Instant::now();
        let mut queued = Job::new(JobId::next(), noop_target(), now);
        assert!(queued.transition(JobState::Cancelled, now));
        assert!(queued.result().is_none() && queued.failure().is_none());
        assert!(queued.started_at().is_none());

        let mut running = Job::new(JobId::next(), noop_target(), now);
        running.start(now, Some(Duration::from_millis(1)));
        assert!(running.transition(JobState::TimedOut, now));
        assert!(running.result().is_none() && running.failure().is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "illegal job transition")]
    fn leaving_terminal_state_panics_in_debug() {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        job.start(now, None);
        job.complete(Ok(JobValue::unit()), now);
        job.transition(JobState::Running, now);
    }
}
