//! # ListenerBus: ordered, failure-isolating fan-out.
//!
//! [`ListenerBus`] keeps the registered [`JobListener`]s and delivers each
//! [`JobEvent`] to all of them.
//!
//! ## What it guarantees
//! - Delivery in registration order.
//! - Every listener is attempted; an error or panic in one never aborts the broadcast.
//! - Each failure is logged and returned as a [`DeliveryFailure`].
//! - Register/unregister are idempotent by identity (`Arc` allocation).
//!
//! ## Diagram
//! ```text
//!    notify(&JobEvent)
//!        │   (snapshot of listeners, lock released)
//!        ├──► L1.on_event() ── Ok
//!        ├──► L2.on_event() ── Err/panic ──► warn! + DeliveryFailure
//!        └──► L3.on_event() ── Ok
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::warn;

use crate::error::{ListenerError, describe_panic};
use crate::events::JobEvent;

use super::ListenerRef;

/// One listener's failure to handle an event.
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// Listener name.
    pub listener: &'static str,
    /// What went wrong.
    pub error: ListenerError,
}

/// Registry of lifecycle listeners.
#[derive(Default)]
pub struct ListenerBus {
    listeners: RwLock<Vec<ListenerRef>>,
}

impl ListenerBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener`; returns `false` if the same instance is already registered.
    pub fn register(&self, listener: ListenerRef) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Removes `listener`; returns `false` if it was not registered.
    pub fn unregister(&self, listener: &ListenerRef) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|l| same_listener(l, listener)) {
            Some(idx) => {
                listeners.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// Listeners registered or removed while a broadcast is in progress take
    /// effect from the next event.
    pub async fn notify(&self, event: &JobEvent) -> Vec<DeliveryFailure> {
        let listeners: Vec<ListenerRef> = self.listeners.read().clone();
        let mut failures = Vec::new();

        for listener in &listeners {
            let fut = listener.on_event(event);
            let error = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic) => ListenerError::Panicked {
                    info: describe_panic(panic.as_ref()),
                },
            };
            warn!(
                listener = listener.name(),
                job_id = %event.job.id(),
                kind = %event.kind,
                error = %error,
                "listener failed to handle job event"
            );
            failures.push(DeliveryFailure {
                listener: listener.name(),
                error,
            });
        }
        failures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Job, JobId, noop_target};
    use crate::listeners::JobListener;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl JobListener for Recorder {
        async fn on_event(&self, ev: &JobEvent) -> Result<(), ListenerError> {
            self.seen.lock().push(ev.seq);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl JobListener for Failing {
        async fn on_event(&self, _ev: &JobEvent) -> Result<(), ListenerError> {
            Err(ListenerError::fail("sink unavailable"))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct Panicking;

    #[async_trait]
    impl JobListener for Panicking {
        async fn on_event(&self, _ev: &JobEvent) -> Result<(), ListenerError> {
            panic!("listener exploded");
        }
        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn started_event() -> JobEvent {
        let now = Instant::now();
        let mut job = Job::new(JobId::next(), noop_target(), now);
        job.start(now, None);
        JobEvent::from_job(job).expect("running is observable")
    }

    #[test]
    fn register_is_idempotent_by_identity() {
        let bus = ListenerBus::new();
        let a: ListenerRef = Arc::new(Recorder::default());
        let b: ListenerRef = Arc::new(Recorder::default());

        assert!(bus.register(a.clone()));
        assert!(!bus.register(a.clone()));
        assert!(bus.register(b.clone()));
        assert_eq!(bus.len(), 2);

        assert!(bus.unregister(&a));
        assert!(!bus.unregister(&a));
        assert_eq!(bus.len(), 1);
        assert!(bus.unregister(&b));
        assert!(bus.is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_broadcast() {
        let bus = ListenerBus::new();
        let first = Arc::new(Recorder::default());
        let last = Arc::new(Recorder::default());
        bus.register(first.clone());
        bus.register(Arc::new(Failing));
        bus.register(Arc::new(Panicking));
        bus.register(last.clone());

        let ev = started_event();
        let failures = bus.notify(&ev).await;

        assert_eq!(*first.seen.lock(), vec![ev.seq]);
        assert_eq!(*last.seen.lock(), vec![ev.seq]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].listener, "failing");
        assert_eq!(failures[0].error, ListenerError::fail("sink unavailable"));
        assert_eq!(failures[1].listener, "panicking");
        assert_eq!(
            failures[1].error,
            ListenerError::Panicked { info: "listener exploded".into() }
        );
    }

    #[tokio::test]
    async fn empty_bus_reports_nothing() {
        let bus = ListenerBus::new();
        assert!(bus.notify(&started_event()).await.is_empty());
    }
}
