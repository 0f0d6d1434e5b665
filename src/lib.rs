//! # jobvisor
//!
//! **Jobvisor** is an asynchronous invocation scheduler for tokio applications.
//!
//! A caller that does not want to wait for a long-running call submits it as a
//! job, gets an id back immediately, and later polls the job (or listens for
//! lifecycle events) to collect the result. The scheduler bounds how much work
//! it admits, how long each job may run, and how many finished results it keeps.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    Target          Target          Target        (invoker + bound arguments)
//!      │               │               │
//!      ▼               ▼               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (facade)                                               │
//! │  - DispatchPool  (bounded admission queue, fail-fast)             │
//! │  - JobRegistry   (JobId → Job, capacity eviction, retention)      │
//! │  - Sweeper       (periodic timeout enforcement)                   │
//! │  - ListenerBus   (ordered, failure-isolating fan-out)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!    worker 0           worker 1    ...    worker N-1
//!        │ Started → invoke(ctx) → Done | Failed
//!        ▼
//!   ListenerBus ──► L1 ──► L2 ──► ... ──► LN
//! ```
//!
//! ### Lifecycle
//! ```text
//! add_job ─► Queued ─► Running ─┬─► Done       (result)
//!              │          │     ├─► Failed     (failure cause)
//!              │          │     └─► TimedOut   (sweeper, deadline passed)
//!              └──────────┴───────► Cancelled  (remove_job / stop)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                        |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Scheduling**    | Submit, fetch, remove, enumerate jobs; graceful stop.    | [`Scheduler`], [`SchedulerBuilder`]       |
//! | **Targets**       | What a job runs, as a trait or a closure.                | [`Invoke`], [`InvokeFn`], [`Target`]      |
//! | **Jobs**          | Snapshots with state, result or failure, timestamps.     | [`Job`], [`JobId`], [`JobState`]          |
//! | **Listeners**     | Observe lifecycle transitions.                           | [`JobListener`], [`ListenerBus`]          |
//! | **Errors**        | Typed errors for admission, invocation, listeners.       | [`SubmitError`], [`InvocationError`]      |
//! | **Configuration** | Capacity, concurrency and time bounds.                   | [`SchedulerConfig`]                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{
//!     Arguments, InvokeFn, InvokeRef, JobState, JobValue, LogListener, Scheduler,
//!     SchedulerConfig, Target,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = SchedulerConfig::default();
//!     cfg.thread_pool_size = 2;
//!     cfg.job_timeout = Duration::from_secs(5);
//!
//!     let sched = Scheduler::builder(cfg)
//!         .with_listener(Arc::new(LogListener::new()))
//!         .build();
//!
//!     let render: InvokeRef = InvokeFn::arc("report.render", |args: Arguments, _ctx: CancellationToken| async move {
//!         let pages = args.get_as::<u32>(0).copied().unwrap_or(1);
//!         Ok(JobValue::new(format!("{pages} pages")))
//!     });
//!
//!     let job = sched.add_job(Target::new(render, Arguments::new().with(3_u32)))?;
//!     println!("poll {}", sched.job_uri(job.id()));
//!
//!     while !sched.get_job(job.id()).is_some_and(|j| j.is_terminal()) {
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!     }
//!     let done = sched.get_job(job.id()).expect("still resident");
//!     assert_eq!(done.state(), JobState::Done);
//!
//!     sched.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod jobs;
mod listeners;

// ---- Public re-exports ----

pub use core::{Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerStats};
pub use error::{ConfigError, InvocationError, ListenerError, RuntimeError, SubmitError};
pub use events::{JobEvent, JobEventKind};
pub use jobs::{
    Arguments, BoxInvokeFuture, Invoke, InvokeFn, InvokeRef, Job, JobId, JobState, JobValue,
    Target,
};
pub use listeners::{DeliveryFailure, JobListener, ListenerBus, ListenerRef, LogListener};
