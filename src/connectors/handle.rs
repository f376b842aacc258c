//! [`Handle`]: attach an error-observer to a primary child without recovering from failure.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::Name;
use crate::panic_guard::{catch_panic, panic_message};
use crate::processor::Handler;

/// Runs a primary child; on failure, feeds the structured [`Error<T>`] to an observer
/// [`Handler`] before returning it.
///
/// `Handle` never recovers: the observer's signature (`Result<Error<T>, E>`) has no success
/// variant, so there is no way for an observer to turn a failure into an `Ok(T)`. A caller
/// wanting recovery should compose a [`Fallback`](crate::connectors::Fallback) whose second
/// child synthesizes a value instead. If the observer itself fails to complete its compensating
/// side effect, `Handle` returns a fresh error wrapping the observer's own failure
/// (`Cause::Domain`) rather than silently keeping the primary's original error, since the
/// observer's failure means the compensating side effect (e.g. releasing a reservation) is not
/// known to have happened. `Handler` has no leaf boundary of its own (it is not a `Chainable`),
/// so `Handle` traps a panicking observer itself, the same way every other leaf adapter traps
/// its user function's panics.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Handle;
/// use flow_rail::processor::{Apply, Handler};
/// use flow_rail::{Chainable, Context};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("down")]
/// struct Down;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("notify failed")]
/// struct NotifyFailed;
///
/// #[tokio::main]
/// async fn main() {
///     let observed = Arc::new(AtomicBool::new(false));
///     let observed2 = Arc::clone(&observed);
///     let handle = Handle::new(
///         "guarded",
///         Apply::new("primary", |_: &Context, _: i32| async move { Err::<i32, _>(Down) }),
///         Handler::new("log", move |_: &Context, err: flow_rail::Error<i32>| {
///             let observed2 = Arc::clone(&observed2);
///             async move {
///                 observed2.store(true, Ordering::SeqCst);
///                 Ok::<_, NotifyFailed>(err)
///             }
///         }),
///     );
///     assert!(handle.process(&Context::background(), 1).await.is_err());
///     assert!(observed.load(Ordering::SeqCst));
/// }
/// ```
pub struct Handle<T, F, E> {
    name: Name,
    primary: Arc<dyn Chainable<T>>,
    observer: Handler<T, F, E>,
}

impl<T, F, Fut, E> Handle<T, F, E>
where
    T: Send + 'static,
    F: Fn(&Context, Error<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Error<T>, E>> + Send,
{
    /// Builds a `Handle` named `name` wrapping `primary`, observed by `observer` on failure.
    pub fn new(name: impl Into<Name>, primary: impl Chainable<T> + 'static, observer: Handler<T, F, E>) -> Self {
        Self { name: name.into(), primary: Arc::new(primary), observer }
    }
}

#[async_trait]
impl<T, F, Fut, E> Chainable<T> for Handle<T, F, E>
where
    T: Clone + Send + 'static,
    F: Fn(&Context, Error<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Error<T>, E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        // Cloned before `primary` consumes `input`, so the observer-failure branch below still
        // has a T to attach to the error it builds — `Handler::observe` consumes the primary's
        // `Error<T>` by value and does not hand it back on its own failure.
        let observed_input = input.clone();

        let err = match self.primary.process(ctx, input).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match catch_panic(self.observer.observe(ctx, err)).await {
            Ok(Ok(modified)) => Err(modified.with_prefix(self.name.clone())),
            Ok(Err(observer_failed)) => {
                Err(Error::new(self.name.clone(), observed_input, Cause::Domain(observer_failed)))
            },
            Err(payload) => Err(Error::new::<std::convert::Infallible>(
                self.name.clone(),
                observed_input,
                Cause::Panic(panic_message(payload)),
            )),
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}
