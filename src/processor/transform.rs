//! [`Transform`]: a processor whose user function cannot fail.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// A leaf [`Chainable`] built from an infallible function `fn(&Context, T) -> T`.
///
/// Since the function has no error channel, `Transform::process` never returns `Err` on its own
/// — it can still fail if the future it returns panics, which is trapped the same way every
/// other leaf adapter traps panics.
///
/// # Examples
///
/// ```
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context};
///
/// #[tokio::main]
/// async fn main() {
///     let step = Transform::new("uppercase", |_ctx: &Context, s: String| async move { s.to_uppercase() });
///     assert_eq!(step.process(&Context::background(), "hi".to_string()).await.unwrap(), "HI");
/// }
/// ```
pub struct Transform<T, F> {
    name: Name,
    f: F,
    _t: PhantomData<fn(T) -> T>,
}

impl<T, F, Fut> Transform<T, F>
where
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
{
    /// Builds a new `Transform` processor named `name`, delegating to `f`.
    pub fn new(name: impl Into<Name>, f: F) -> Self {
        Self { name: name.into(), f, _t: PhantomData }
    }
}

#[async_trait]
impl<T, F, Fut> Chainable<T> for Transform<T, F>
where
    T: Clone + Send + 'static,
    F: Fn(&Context, T) -> Fut + Send + Sync,
    Fut: Future<Output = T> + Send,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        use std::panic::AssertUnwindSafe;

        use futures::FutureExt;

        let observed = input.clone();
        match AssertUnwindSafe((self.f)(ctx, input)).catch_unwind().await {
            Ok(value) => Ok(value),
            Err(payload) => Err(Error::new::<std::convert::Infallible>(
                self.name.clone(),
                observed,
                crate::error::Cause::Panic(crate::panic_guard::panic_message(payload)),
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

    #[tokio::test]
    async fn never_fails() {
        let step = Transform::new("incr", |_: &Context, n: i32| async move { n + 1 });
        assert_eq!(step.process(&Context::background(), 41).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn panic_is_trapped() {
        let step = Transform::new("boom", |_: &Context, _: i32| async move {
            panic!("transform boom");
            #[allow(unreachable_code)]
            0
        });
        let err = step.process(&Context::background(), 1).await.unwrap_err();
        assert!(matches!(err.cause(), crate::error::Cause::Panic(_)));
    }
}
