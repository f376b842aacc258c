//! [`Effect`]: a processor run for its side effects, passing its input through unchanged.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{domain_error, Cause, Error};
use crate::name::Name;
use crate::panic_guard::{catch_panic, panic_message};

/// A leaf [`Chainable`] built from a function `fn(&Context, &T) -> Result<(), E>`.
///
/// The canonical validator/logging shape: on success the input passes through unchanged, on
/// error it is wrapped the same way [`Apply`](super::Apply) wraps a rejection. Because the
/// function only borrows `T`, no `Clone` bound is needed — `Effect` always owns the input
/// throughout the call.
///
/// # Examples
///
/// ```
/// use flow_rail::processor::Effect;
/// use flow_rail::{Chainable, Context};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("too long")]
/// struct TooLong;
///
/// #[tokio::main]
/// async fn main() {
///     let validate = Effect::new("max-len", |_ctx: &Context, s: &String| async move {
///         if s.len() > 10 { Err(TooLong) } else { Ok(()) }
///     });
///     assert_eq!(validate.process(&Context::background(), "ok".to_string()).await.unwrap(), "ok");
/// }
/// ```
pub struct Effect<T, F> {
    name: Name,
    f: F,
    _t: PhantomData<fn(&T)>,
}

impl<T, F, Fut, E> Effect<T, F>
where
    F: Fn(&Context, &T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Builds a new `Effect` processor named `name`, delegating to `f`.
    pub fn new(name: impl Into<Name>, f: F) -> Self {
        Self { name: name.into(), f, _t: PhantomData }
    }
}

#[async_trait]
impl<T, F, Fut, E> Chainable<T> for Effect<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&Context, &T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let fut = (self.f)(ctx, &input);
        match catch_panic(fut).await {
            Ok(Ok(())) => Ok(input),
            Ok(Err(err)) => {
                Err(domain_error(self.name.clone(), input, err, ctx.is_canceled(), ctx.is_expired()))
            },
            Err(payload) => Err(Error::new::<std::convert::Infallible>(
                self.name.clone(),
                input,
                Cause::Panic(panic_message(payload)),
            )),
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("invalid")]
    struct Invalid;

    #[tokio::test]
    async fn success_passes_through_unchanged() {
        let step = Effect::new("check", |_: &Context, n: &i32| {
            let ok = *n >= 0;
            async move { if ok { Ok::<_, Invalid>(()) } else { Err(Invalid) } }
        });
        assert_eq!(step.process(&Context::background(), 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn failure_wraps_with_name_and_original_input() {
        let step = Effect::new("check", |_: &Context, _n: &i32| async move { Err::<(), _>(Invalid) });
        let err = step.process(&Context::background(), -1).await.unwrap_err();
        assert_eq!(*err.input(), -1);
        assert_eq!(err.path(), &[Name::new("check")]);
    }

    #[tokio::test]
    async fn failure_reflects_canceled_context() {
        let step = Effect::new("check", |_: &Context, _n: &i32| async move { Err::<(), _>(Invalid) });
        let ctx = Context::background();
        ctx.cancel();
        let err = step.process(&ctx, -1).await.unwrap_err();
        assert!(err.is_canceled());
    }
}
