//! [`MutateIf`]: a transform gated by a synchronous predicate on `T`.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::Name;
use crate::panic_guard::{catch_panic, panic_message};

/// A leaf [`Chainable`] gating a transform behind a predicate: if `p(ctx, &input)` is true,
/// returns `t(ctx, input)`; otherwise returns `input` unchanged. Neither the predicate nor the
/// transform may fail — the only failure `process` can report is a trapped panic.
///
/// The predicate is a plain synchronous closure (`Fn(&Context, &T) -> bool`), matching
/// [`Filter`](crate::connectors::Filter)'s predicate: gating logic is expected to be cheap and
/// local, not an I/O round trip.
///
/// # Examples
///
/// ```
/// use flow_rail::processor::MutateIf;
/// use flow_rail::{Chainable, Context};
///
/// #[tokio::main]
/// async fn main() {
///     let step = MutateIf::new(
///         "clamp-negative",
///         |_ctx: &Context, n: &i32| *n < 0,
///         |_ctx: &Context, _n: i32| async move { 0 },
///     );
///     assert_eq!(step.process(&Context::background(), -5).await.unwrap(), 0);
///     assert_eq!(step.process(&Context::background(), 5).await.unwrap(), 5);
/// }
/// ```
pub struct MutateIf<T, P, F> {
    name: Name,
    predicate: P,
    transform: F,
    _t: PhantomData<fn(T) -> T>,
}

impl<T, P, F, Fut> MutateIf<T, P, F>
where
    P: Fn(&Context, &T) -> bool + Send + Sync,
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
{
    /// Builds a new `MutateIf` processor named `name`.
    pub fn new(name: impl Into<Name>, predicate: P, transform: F) -> Self {
        Self { name: name.into(), predicate, transform, _t: PhantomData }
    }
}

#[async_trait]
impl<T, P, F, Fut> Chainable<T> for MutateIf<T, P, F>
where
    T: Clone + Send + 'static,
    P: Fn(&Context, &T) -> bool + Send + Sync,
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        if !(self.predicate)(ctx, &input) {
            return Ok(input);
        }
        let observed = input.clone();
        match catch_panic((self.transform)(ctx, input)).await {
            Ok(value) => Ok(value),
            Err(payload) => Err(Error::new::<std::convert::Infallible>(
                self.name.clone(),
                observed,
                Cause::Panic(panic_message(payload)),
            )),
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}
