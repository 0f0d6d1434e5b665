//! # Opaque values carried through the scheduler.
//!
//! The scheduler never inspects what a target returns or what it was called with.
//! [`JobValue`] is a cheap, cloneable type-erased handle; [`Arguments`] is the
//! ordered list of bound argument values produced by the routing layer.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased, shareable value (invocation result or bound argument).
///
/// ## Example
/// ```rust
/// use jobvisor::JobValue;
///
/// let v = JobValue::new(42_u32);
/// assert_eq!(v.downcast_ref::<u32>(), Some(&42));
/// assert!(v.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct JobValue(Arc<dyn Any + Send + Sync>);

impl JobValue {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// The unit value, for targets with nothing to return.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Borrows the inner value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    /// True if the inner value has type `T`.
    pub fn is<T: Any>(&self) -> bool {
        (*self.0).is::<T>()
    }
}

impl fmt::Debug for JobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JobValue(..)")
    }
}

/// Ordered list of bound argument values.
#[derive(Clone, Debug, Default)]
pub struct Arguments(Vec<JobValue>);

impl Arguments {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value (builder style).
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.0.push(JobValue::new(value));
        self
    }

    /// Returns the argument at `index`.
    pub fn get(&self, index: usize) -> Option<&JobValue> {
        self.0.get(index)
    }

    /// Returns the argument at `index` if it has type `T`.
    pub fn get_as<T: Any>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(JobValue::downcast_ref::<T>)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobValue> {
        self.0.iter()
    }
}

impl FromIterator<JobValue> for Arguments {
    fn from_iter<I: IntoIterator<Item = JobValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_keep_order_and_types() {
        let args = Arguments::new().with("user-7").with(3_i64);
        assert_eq!(args.len(), 2);
        assert_eq!(args.get_as::<&str>(0), Some(&"user-7"));
        assert_eq!(args.get_as::<i64>(1), Some(&3));
        assert!(args.get_as::<i64>(0).is_none());
        assert!(args.get(2).is_none());
    }

    #[test]
    fn clones_share_the_same_value() {
        let v = JobValue::new(String::from("payload"));
        let w = v.clone();
        assert!(w.is::<String>());
        assert_eq!(w.downcast_ref::<String>().map(String::as_str), Some("payload"));
    }
}
