//! # Lifecycle listeners.
//!
//! This module provides the [`JobListener`] trait, the [`ListenerBus`] that
//! fans events out to registered listeners, and the built-in [`LogListener`].
//!
//! ## Architecture
//! ```text
//! worker / sweeper / remove_job / stop
//!        │ transition committed in JobRegistry
//!        ▼
//!   JobEvent ──► ListenerBus::notify ──► L1 ──► L2 ──► ... ──► LN   (in order)
//!                                          └─ failures logged + collected
//! ```

mod bus;
mod listener;
mod log;

pub use bus::{DeliveryFailure, ListenerBus};
pub use listener::{JobListener, ListenerRef};
pub use log::LogListener;
