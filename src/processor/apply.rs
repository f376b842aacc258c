//! [`Apply`]: a processor whose user function may mutate or reject its input.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;
use crate::panic_guard::guard;

/// A leaf [`Chainable`] built from a function `fn(&Context, T) -> Result<T, E>`.
///
/// `T` must be `Clone`: the pristine input is cloned before the function runs so it can be
/// attached to the resulting [`Error<T>`] if the function rejects it, since the function is
/// free to consume or partially mutate its argument before failing.
///
/// # Examples
///
/// ```
/// use flow_rail::processor::Apply;
/// use flow_rail::{Chainable, Context};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("negative")]
/// struct Negative;
///
/// #[tokio::main]
/// async fn main() {
///     let step = Apply::new("reject-negative", |_ctx: &Context, n: i32| async move {
///         if n < 0 { Err(Negative) } else { Ok(n * 2) }
///     });
///     assert_eq!(step.process(&Context::background(), 3).await.unwrap(), 6);
///     assert!(step.process(&Context::background(), -1).await.is_err());
/// }
/// ```
pub struct Apply<T, F> {
    name: Name,
    f: F,
    _t: PhantomData<fn(T) -> T>,
}

impl<T, F, Fut, E> Apply<T, F>
where
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Builds a new `Apply` processor named `name`, delegating to `f`.
    pub fn new(name: impl Into<Name>, f: F) -> Self {
        Self { name: name.into(), f, _t: PhantomData }
    }
}

#[async_trait]
impl<T, F, Fut, E> Chainable<T> for Apply<T, F>
where
    T: Clone + Send + 'static,
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let observed = input.clone();
        guard(&self.name, ctx, observed, (self.f)(ctx, input)).await
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("rejected")]
    struct Rejected;

    #[tokio::test]
    async fn success_returns_transformed_value() {
        let step = Apply::new("double", |_: &Context, n: i32| async move { Ok::<_, Rejected>(n * 2) });
        assert_eq!(step.process(&Context::background(), 21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn error_preserves_pristine_input() {
        let step = Apply::new("reject", |_: &Context, _n: i32| async move { Err::<i32, _>(Rejected) });
        let err = step.process(&Context::background(), 5).await.unwrap_err();
        assert_eq!(*err.input(), 5);
        assert_eq!(err.path(), &[Name::new("reject")]);
    }

    #[tokio::test]
    async fn error_reflects_canceled_context() {
        let step = Apply::new("reject", |_: &Context, _n: i32| async move { Err::<i32, _>(Rejected) });
        let ctx = Context::background();
        ctx.cancel();
        let err = step.process(&ctx, 5).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn panic_is_trapped() {
        let step = Apply::new("boom", |_: &Context, _n: i32| async move {
            panic!("apply boom");
            #[allow(unreachable_code)]
            Ok::<i32, Rejected>(0)
        });
        let err = step.process(&Context::background(), 1).await.unwrap_err();
        assert!(matches!(err.cause(), crate::error::Cause::Panic(_)));
    }
}
