//! Lifecycle events emitted by workers, the sweeper and the facade.
//!
//! ## Contents
//! - [`JobEventKind`], [`JobEvent`]: event classification and payload
//!
//! Delivery is handled by [`ListenerBus`](crate::ListenerBus).

mod event;

pub use event::{JobEvent, JobEventKind};
