//! Error types used by the scheduler runtime, invocation targets and listeners.
//!
//! - [`SubmitError`]: admission failures surfaced synchronously by `add_job`.
//! - [`InvocationError`]: failures raised by an invocation target; recorded on the job.
//! - [`ListenerError`]: failures raised by a lifecycle listener; isolated per listener.
//! - [`RuntimeError`]: failures of the scheduler runtime itself (shutdown).
//! - [`ConfigError`]: malformed configuration overrides.
//!
//! Every enum exposes `as_label` returning a short stable label for logs/metrics.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// # Errors returned when submitting a job.
///
/// Only these errors are surfaced synchronously to the submitting caller;
/// everything else is recorded on the job and observed asynchronously.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Admission queue is saturated and no worker can take the job (retry later).
    #[error("admission queue full (capacity {capacity}); retry later")]
    Rejected {
        /// Configured admission queue capacity.
        capacity: usize,
    },

    /// Scheduler was stopped and no longer accepts submissions.
    #[error("scheduler stopped")]
    Stopped,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::SubmitError;
    ///
    /// let err = SubmitError::Rejected { capacity: 8 };
    /// assert_eq!(err.as_label(), "submit_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Rejected { .. } => "submit_rejected",
            SubmitError::Stopped => "submit_stopped",
        }
    }

    /// True if the caller may retry the submission later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Rejected { .. })
    }
}

/// # Errors produced by an invocation target.
///
/// Captured on the job as its failure cause; never propagated into the worker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// The target reported an error.
    #[error("invocation failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The target panicked while running.
    #[error("invocation panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The target observed cancellation and gave up.
    #[error("invocation cancelled")]
    Canceled,
}

impl InvocationError {
    /// Builds a [`InvocationError::Fail`] from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        InvocationError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InvocationError::Fail { .. } => "invocation_failed",
            InvocationError::Panicked { .. } => "invocation_panicked",
            InvocationError::Canceled => "invocation_canceled",
        }
    }
}

/// # Errors produced by a lifecycle listener.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The listener reported an error.
    #[error("listener failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The listener panicked while handling an event.
    #[error("listener panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ListenerError {
    /// Builds a [`ListenerError::Fail`] from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        ListenerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fail { .. } => "listener_failed",
            ListenerError::Panicked { .. } => "listener_panicked",
        }
    }
}

/// # Errors produced by the scheduler runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Workers did not exit within the stop grace period and were aborted.
    #[error("stop grace {grace:?} exceeded; {stuck} background task(s) aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of background tasks still running when the grace ran out.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced while reading configuration overrides.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A key was present but its value could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Configuration key.
        key: String,
        /// Raw value as read.
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(SubmitError::Stopped.as_label(), "submit_stopped");
        assert_eq!(InvocationError::fail("x").as_label(), "invocation_failed");
        assert_eq!(
            ListenerError::Panicked { info: "p".into() }.as_label(),
            "listener_panicked"
        );
        let cfg = ConfigError::Invalid {
            key: "K".into(),
            value: "v".into(),
            reason: "r".into(),
        };
        assert_eq!(cfg.as_label(), "config_invalid");
    }

    #[test]
    fn only_rejection_is_retryable() {
        assert!(SubmitError::Rejected { capacity: 1 }.is_retryable());
        assert!(!SubmitError::Stopped.is_retryable());
    }

    #[test]
    fn describe_panic_handles_str_and_string() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(describe_panic(a.as_ref()), "boom");
        assert_eq!(describe_panic(b.as_ref()), "bang");
        assert_eq!(describe_panic(c.as_ref()), "non-string panic payload");
    }
}
