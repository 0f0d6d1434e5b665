//! # Lifecycle listener trait.
//!
//! Provides [`JobListener`], the extension point for observing job transitions.
//!
//! ## Rules
//! - Listeners are awaited **in registration order** on the task that performed
//!   the transition (worker, sweeper, or the caller of `remove_job`/`stop`).
//! - A slow listener delays that task; keep handlers fast and non-blocking.
//! - Errors and panics are isolated: the remaining listeners still receive the event.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use jobvisor::{JobEvent, JobEventKind, JobListener, ListenerError};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl JobListener for Audit {
//!     async fn on_event(&self, ev: &JobEvent) -> Result<(), ListenerError> {
//!         if ev.kind == JobEventKind::Failed {
//!             // write an audit record, etc.
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::events::JobEvent;

/// Shared handle to a listener. Identity is the `Arc` allocation.
pub type ListenerRef = Arc<dyn JobListener>;

/// Observer of job lifecycle events.
#[async_trait]
pub trait JobListener: Send + Sync + 'static {
    /// Handles one event.
    ///
    /// Returning an error (or panicking) is logged by the bus and never affects
    /// the job or the other listeners.
    async fn on_event(&self, event: &JobEvent) -> Result<(), ListenerError>;

    /// Listener name used in logs.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
