//! The deep-copy operation broadcast connectors and [`Retry`](crate::connectors::Retry) require
//! for a non-trivially-copyable `T`.

use std::sync::Arc;

/// A user-supplied deep-copy operation for `T`.
///
/// Required by [`Race`](crate::connectors::Race), [`Concurrent`](crate::connectors::Concurrent),
/// [`Scaffold`](crate::connectors::Scaffold), and [`Retry`](crate::connectors::Retry) whenever
/// `T` is not simply `Clone`, or whenever the derived `Clone` impl is not deep enough to
/// guarantee no shared mutable substructure crosses a spawned task.
pub type CloneFn<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

/// The strategy a connector uses to produce an independent copy of `T` for each child or
/// retry attempt: either `T`'s own [`Clone`] impl, or an explicit [`CloneFn`].
#[derive(Clone)]
pub(crate) struct Cloner<T>(CloneFn<T>);

impl<T> Cloner<T> {
    /// Builds a cloner backed by `T: Clone`.
    pub(crate) fn derive() -> Self
    where
        T: Clone,
    {
        Self(Arc::new(|t: &T| t.clone()))
    }

    /// Builds a cloner backed by a user-supplied function.
    pub(crate) fn custom(f: CloneFn<T>) -> Self {
        Self(f)
    }

    /// Produces an independent copy of `value`.
    #[inline]
    pub(crate) fn clone_value(&self, value: &T) -> T {
        (self.0)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_uses_clone_impl() {
        let cloner = Cloner::<Vec<i32>>::derive();
        let original = vec![1, 2, 3];
        let copy = cloner.clone_value(&original);
        assert_eq!(original, copy);
    }

    #[test]
    fn custom_clone_fn_is_used() {
        let cloner = Cloner::custom(Arc::new(|n: &i32| n + 100) as CloneFn<i32>);
        assert_eq!(cloner.clone_value(&1), 101);
    }
}
