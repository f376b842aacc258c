//! Tracing integration: wraps any [`Chainable`] in a span per `process` call.
//!
//! Requires the `tracing` feature:
//!
//! ```toml
//! [dependencies]
//! flow-rail = { version = "0.1", features = ["tracing"] }
//! ```
//!
//! Without the feature, [`Traced`] still compiles and wraps its child, but `process` calls
//! straight through with no span — a caller can wrap every connector in `Traced` unconditionally
//! and only pay for instrumentation when the feature is actually turned on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// Wraps `child` so every [`process`](Chainable::process) call runs inside its own
/// [`tracing::Span`](https://docs.rs/tracing/latest/tracing/struct.Span.html), named after the
/// child's [`Name`]. On error, the span records the failure's path and cause before the error
/// continues to propagate unchanged — `Traced` never alters what `process` returns, only what
/// gets recorded around the call.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Sequence;
/// use flow_rail::processor::Transform;
/// use flow_rail::tracing_ext::Traced;
/// use flow_rail::{Chainable, Context};
///
/// #[tokio::main]
/// async fn main() {
///     let traced = Traced::new(
///         Sequence::new("pipeline").then(Transform::new("double", |_: &Context, n: i32| async move { n * 2 })),
///     );
///     assert_eq!(traced.process(&Context::background(), 5).await.unwrap(), 10);
/// }
/// ```
pub struct Traced<T> {
    child: Arc<dyn Chainable<T>>,
}

impl<T> Traced<T>
where
    T: Send + 'static,
{
    /// Wraps `child` for span-per-call instrumentation.
    pub fn new(child: impl Chainable<T> + 'static) -> Self {
        Self { child: Arc::new(child) }
    }
}

#[cfg(feature = "tracing")]
#[async_trait]
impl<T> Chainable<T> for Traced<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        use tracing::Instrument;

        let span = tracing::info_span!("chainable.process", node = %self.child.name());
        async move {
            match self.child.process(ctx, input).await {
                Ok(value) => Ok(value),
                Err(err) => {
                    let path = err
                        .path()
                        .iter()
                        .map(Name::as_str)
                        .collect::<Vec<_>>()
                        .join(" > ");
                    tracing::warn!(path = %path, cause = %err.cause(), "chainable node failed");
                    Err(err)
                },
            }
        }
        .instrument(span)
        .await
    }

    fn name(&self) -> &Name {
        self.child.name()
    }
}

#[cfg(not(feature = "tracing"))]
#[async_trait]
impl<T> Chainable<T> for Traced<T>
where
    T: Send + 'static,
{
    #[inline]
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        self.child.process(ctx, input).await
    }

    #[inline]
    fn name(&self) -> &Name {
        self.child.name()
    }
}
