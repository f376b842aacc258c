//! Leaf-boundary panic trap: converts an unwinding panic into an [`Error<T>`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::context::Context;
use crate::error::{domain_error, Cause, Error};
use crate::name::Name;

/// Extracts a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs `fut` to completion, trapping any unwinding panic instead of letting it propagate.
///
/// The lowest-level building block: callers whose future's output type does not match the `T`
/// they need to preserve for [`Error::input`] (e.g. [`Effect`](crate::processor::Effect), whose
/// function returns `Result<(), E>` while the node's input is `T`) build their own `Error<T>`
/// from the trapped payload via [`panic_message`]; callers whose future resolves to `Result<T,
/// E>` directly can use [`guard`] instead.
pub(crate) async fn catch_panic<Fut, O>(fut: Fut) -> Result<O, Box<dyn Any + Send>>
where
    Fut: Future<Output = O>,
{
    AssertUnwindSafe(fut).catch_unwind().await
}

/// Runs `fut`, trapping any panic and converting it into an `Error<T>` rooted at `name` with
/// `input` preserved as the error's observed input.
///
/// `input` must be captured before `fut` is built so it survives the panic. Every leaf
/// processor adapter routes its user function through this guard (or the lower-level
/// [`catch_panic`] when its output type does not line up with `T`); composite connectors rely
/// on their own task-spawn boundary (`JoinError::is_panic`) instead.
///
/// A domain error is flagged `timeout`/`canceled` from `ctx`'s own termination state: a processor
/// can return its own rejection in the same beat `ctx` expires or is canceled, and a caller
/// deciding whether to retry needs that reflected on the error it sees, not just on errors the
/// core itself originates.
pub(crate) async fn guard<T, Fut, E>(name: &Name, ctx: &Context, input: T, fut: Fut) -> Result<T, Error<T>>
where
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match catch_panic(fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(domain_error(name.clone(), input, err, ctx.is_canceled(), ctx.is_expired())),
        Err(payload) => Err(Error::new::<std::convert::Infallible>(
            name.clone(),
            input,
            Cause::Panic(panic_message(payload)),
        )),
    }
}
