//! [`Handler`]: an error-observer processor, used only as the observer argument to
//! [`Handle`](crate::connectors::Handle).

use std::future::Future;
use std::marker::PhantomData;

use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// A function that observes (and may annotate) a failed node's [`Error<T>`], returning a
/// possibly-modified error. Unlike the other processor variants, `Handler` does not implement
/// [`Chainable`](crate::Chainable) itself — it operates on `Error<T>`, not `T`, and is
/// consumed directly by [`Handle`](crate::connectors::Handle) rather than composed as a child.
///
/// The observer's return type has no success variant: it is structurally impossible for a
/// `Handler` to convert a failure into success. Callers wanting recovery should use
/// [`Fallback`](crate::connectors::Fallback) instead.
///
/// # Examples
///
/// ```
/// use flow_rail::processor::Handler;
/// use flow_rail::Context;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("notify failed")]
/// struct NotifyFailed;
///
/// let _observer = Handler::new("log-failure", |_ctx: &Context, err: flow_rail::Error<i32>| async move {
///     eprintln!("pipeline failed: {err}");
///     Ok::<_, NotifyFailed>(err)
/// });
/// ```
pub struct Handler<T, F, E> {
    name: Name,
    f: F,
    _t: PhantomData<(fn(T), E)>,
}

impl<T, F, Fut, E> Handler<T, F, E>
where
    F: Fn(&Context, Error<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Error<T>, E>> + Send,
{
    /// Builds a new `Handler` named `name`, delegating to `f`.
    pub fn new(name: impl Into<Name>, f: F) -> Self {
        Self { name: name.into(), f, _t: PhantomData }
    }

    /// This handler's identifier.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Invokes the observer, returning the possibly-modified error or the observer's own
    /// failure if it could not complete its compensating side effects.
    pub async fn observe(&self, ctx: &Context, err: Error<T>) -> Result<Error<T>, E> {
        (self.f)(ctx, err).await
    }
}
