//! # Job data model and invocation targets.
//!
//! - [`Job`], [`JobId`], [`JobState`]: tracked state of one invocation
//! - [`Invoke`], [`InvokeFn`], [`InvokeRef`], [`Target`]: what a job runs
//! - [`JobValue`], [`Arguments`]: opaque values passed in and out

mod job;
mod target;
mod value;

pub use job::{Job, JobId, JobState};
pub use target::{BoxInvokeFuture, Invoke, InvokeFn, InvokeRef, Target};
pub use value::{Arguments, JobValue};

#[cfg(test)]
pub(crate) use job::tests::noop_target;
