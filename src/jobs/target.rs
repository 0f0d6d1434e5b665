//! # Invocation targets.
//!
//! The scheduler depends only on the [`Invoke`] capability: something with a
//! stable name that, given bound [`Arguments`] and a [`CancellationToken`],
//! produces a future resolving to a [`JobValue`] or an [`InvocationError`].
//! The routing layer builds a [`Target`] (invoker + bound arguments) and hands it
//! to [`Scheduler::add_job`](crate::Scheduler::add_job).
//!
//! [`InvokeFn`] is the closure-backed implementation; each call creates a fresh
//! future, so no state leaks between invocations.
//!
//! ## Cancellation
//! The token fires when the job times out, is removed, or the scheduler stops.
//! Targets should observe it at their await points; the worker drops the
//! invocation future as soon as it fires regardless.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::InvocationError;
use crate::jobs::value::{Arguments, JobValue};

/// Boxed future returned by [`Invoke::invoke`].
pub type BoxInvokeFuture =
    Pin<Box<dyn Future<Output = Result<JobValue, InvocationError>> + Send + 'static>>;

/// Shared handle to an invocation target.
pub type InvokeRef = Arc<dyn Invoke>;

/// # Callable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use jobvisor::{Arguments, BoxInvokeFuture, Invoke, JobValue};
///
/// struct Echo;
///
/// impl Invoke for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     fn invoke(&self, args: Arguments, _ctx: CancellationToken) -> BoxInvokeFuture {
///         Box::pin(async move {
///             Ok(args.get(0).cloned().unwrap_or_else(JobValue::unit))
///         })
///     }
/// }
/// ```
pub trait Invoke: Send + Sync + 'static {
    /// Stable, human-readable target name (e.g. the resource method).
    fn name(&self) -> &str;

    /// Starts one invocation with the given arguments.
    fn invoke(&self, args: Arguments, ctx: CancellationToken) -> BoxInvokeFuture;
}

/// Function-backed invocation target.
#[derive(Debug)]
pub struct InvokeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> InvokeFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the target and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use jobvisor::{Arguments, Invoke, InvokeFn, InvokeRef, JobValue};
    ///
    /// let t: InvokeRef = InvokeFn::arc("hello", |_args: Arguments, _ctx: CancellationToken| async {
    ///     Ok(JobValue::new("hi"))
    /// });
    /// assert_eq!(t.name(), "hello");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Invoke for InvokeFn<F>
where
    F: Fn(Arguments, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JobValue, InvocationError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: Arguments, ctx: CancellationToken) -> BoxInvokeFuture {
        Box::pin((self.f)(args, ctx))
    }
}

/// Invocation target plus its bound arguments.
#[derive(Clone)]
pub struct Target {
    invoker: InvokeRef,
    args: Arguments,
}

impl Target {
    pub fn new(invoker: InvokeRef, args: Arguments) -> Self {
        Self { invoker, args }
    }

    /// Target without arguments.
    pub fn bare(invoker: InvokeRef) -> Self {
        Self::new(invoker, Arguments::new())
    }

    pub fn name(&self) -> &str {
        self.invoker.name()
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn invoker(&self) -> &InvokeRef {
        &self.invoker
    }

    pub(crate) fn invoke(&self, ctx: CancellationToken) -> BoxInvokeFuture {
        self.invoker.invoke(self.args.clone(), ctx)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name())
            .field("args", &self.args.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invoke_fn_receives_bound_arguments() {
        let add: InvokeRef = InvokeFn::arc("add", |args: Arguments, _ctx: CancellationToken| async move {
            let a = args.get_as::<i32>(0).copied().ok_or_else(|| InvocationError::fail("missing a"))?;
            let b = args.get_as::<i32>(1).copied().ok_or_else(|| InvocationError::fail("missing b"))?;
            Ok::<_, InvocationError>(JobValue::new(a + b))
        });

        let target = Target::new(add, Arguments::new().with(2_i32).with(5_i32));
        assert_eq!(target.name(), "add");

        let out = target.invoke(CancellationToken::new()).await.expect("invocation ok");
        assert_eq!(out.downcast_ref::<i32>(), Some(&7));
    }

    #[tokio::test]
    async fn missing_arguments_surface_as_failure() {
        let add: InvokeRef = InvokeFn::arc("add", |args: Arguments, _ctx: CancellationToken| async move {
            args.get(0).cloned().ok_or_else(|| InvocationError::fail("missing a"))
        });
        let err = Target::bare(add)
            .invoke(CancellationToken::new())
            .await
            .expect_err("no arguments bound");
        assert_eq!(err, InvocationError::fail("missing a"));
    }
}
