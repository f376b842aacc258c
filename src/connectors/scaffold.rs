//! [`Scaffold`]: fire-and-forget parallel children with a detached lifetime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::clone_fn::{CloneFn, Cloner};
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// Starts every child concurrently on its own clone of the input and returns immediately with
/// the original input and no error, without waiting for any child to finish.
///
/// Children run under a context *detached* from the caller's deadline (see
/// [`Context::detached_child`]) but still rooted in the caller's cancellation lineage, so a
/// process-wide shutdown still reaches them even though the caller's own per-call timeout does
/// not. Child errors are swallowed by design — `Scaffold` is for purely asynchronous side
/// effects; a caller that needs to observe a scaffolded child's failure should wrap that child
/// in [`Handle`](crate::connectors::Handle) itself.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Scaffold;
/// use flow_rail::processor::Apply;
/// use flow_rail::{Chainable, Context};
/// use std::time::{Duration, Instant};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("slow")]
/// struct Slow;
///
/// #[tokio::main]
/// async fn main() {
///     let scaffold = Scaffold::new("notify").with(Apply::new("send", |_: &Context, n: i32| async move {
///         tokio::time::sleep(Duration::from_secs(1)).await;
///         Ok::<_, Slow>(n)
///     }));
///     let start = Instant::now();
///     assert_eq!(scaffold.process(&Context::background(), 1).await.unwrap(), 1);
///     assert!(start.elapsed() < Duration::from_millis(100));
/// }
/// ```
pub struct Scaffold<T> {
    name: Name,
    children: Vec<Arc<dyn Chainable<T>>>,
    cloner: Cloner<T>,
}

impl<T> Scaffold<T>
where
    T: Clone + Send + 'static,
{
    /// Builds a new, childless `Scaffold` named `name`, cloning inputs via `T::clone`.
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::derive() }
    }
}

impl<T> Scaffold<T>
where
    T: Send + 'static,
{
    /// Builds a new, childless `Scaffold` named `name`, cloning inputs via a user-supplied
    /// function.
    pub fn with_clone(name: impl Into<Name>, clone_fn: CloneFn<T>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::custom(clone_fn) }
    }

    /// Builder-style addition of one more fire-and-forget child.
    #[must_use]
    pub fn with(mut self, child: impl Chainable<T> + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Scaffold<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let detached = ctx.detached_child();
        for child in &self.children {
            let child = Arc::clone(child);
            let task_ctx = detached.clone();
            let cloned_input = self.cloner.clone_value(&input);
            #[cfg(feature = "tracing")]
            let scaffold_name = self.name.clone();
            #[cfg(feature = "tracing")]
            let child_name = child.name().clone();

            tokio::spawn(async move {
                let result = child.process(&task_ctx, cloned_input).await;
                #[cfg(feature = "tracing")]
                match &result {
                    Ok(_) => tracing::debug!(connector = %scaffold_name, child = %child_name, "scaffold child completed"),
                    Err(err) => tracing::warn!(connector = %scaffold_name, child = %child_name, %err, "scaffold child failed"),
                }
                #[cfg(not(feature = "tracing"))]
                let _ = &result;
            });
        }
        Ok(input)
    }

    fn name(&self) -> &Name {
        &self.name
    }
}
