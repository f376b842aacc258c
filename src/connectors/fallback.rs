//! [`Fallback`]: try children in declared order until one succeeds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::Name;

/// Tries each child in declared order, returning the first success. If every child fails,
/// returns the last child's error with `Fallback`'s own name prepended.
///
/// Children share the same [`Context`] across attempts — `Fallback` applies no per-attempt
/// timeout of its own; wrap a child in [`Timeout`](crate::connectors::Timeout) for that. If the
/// context is already canceled, `Fallback` stops immediately rather than trying any child.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Fallback;
/// use flow_rail::processor::Apply;
/// use flow_rail::{Chainable, Context};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("down")]
/// struct Down;
///
/// #[tokio::main]
/// async fn main() {
///     let fb = Fallback::new("primary-then-backup")
///         .or_else(Apply::new("primary", |_: &Context, _: i32| async move { Err::<i32, _>(Down) }))
///         .or_else(Apply::new("backup", |_: &Context, n: i32| async move { Ok::<_, Down>(n) }));
///     assert_eq!(fb.process(&Context::background(), 7).await.unwrap(), 7);
/// }
/// ```
pub struct Fallback<T> {
    name: Name,
    children: Vec<Arc<dyn Chainable<T>>>,
}

impl<T> Fallback<T>
where
    T: Send + 'static,
{
    /// Builds a new, childless `Fallback` named `name`.
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), children: Vec::new() }
    }

    /// Builder-style append of the next alternative to try.
    #[must_use]
    pub fn or_else(mut self, child: impl Chainable<T> + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Fallback<T>
where
    T: Clone + Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        if self.children.is_empty() {
            return Ok(input);
        }
        let last_idx = self.children.len() - 1;
        let mut last_err = None;
        let mut carried = Some(input);
        for (idx, child) in self.children.iter().enumerate() {
            let attempt_input = carried.take().expect("carried is repopulated every iteration but the last");
            if ctx.is_canceled() {
                return Err(Error::new::<std::convert::Infallible>(
                    self.name.clone(),
                    attempt_input,
                    Cause::Canceled,
                )
                .with_canceled(true));
            }
            let next_carry = if idx != last_idx { Some(attempt_input.clone()) } else { None };
            match child.process(ctx, attempt_input).await {
                Ok(value) => return Ok(value),
                Err(err) => last_err = Some(err),
            }
            carried = next_carry;
        }
        Err(last_err.expect("non-empty children guarantees at least one attempt").with_prefix(self.name.clone()))
    }

    fn name(&self) -> &Name {
        &self.name
    }
}
