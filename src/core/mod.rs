//! Runtime core: admission, execution, time bounds and the public facade.
//!
//! The only public API from this module is [`Scheduler`] (plus its builder,
//! config and stats types).
//!
//! Internal modules:
//! - [`registry`]: bounded job store with capacity eviction and retention expiry;
//! - [`pool`]: bounded admission queue and worker spawning;
//! - [`worker`]: executes one job with panic capture and cooperative cancellation;
//! - [`sweeper`]: periodic timeout/retention enforcement;
//! - [`scheduler`]: facade composing the above, shutdown;
//! - [`builder`]: assembles a scheduler and starts its background tasks.

mod builder;
mod config;
mod pool;
mod registry;
mod scheduler;
mod sweeper;
mod worker;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use registry::SchedulerStats;
pub use scheduler::Scheduler;
