//! The uniform execution contract satisfied by every node in a graph.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// The single capability every leaf processor and composite connector implements.
///
/// `Chainable` is an [`async_trait`] object-safe trait so heterogeneous children can be stored
/// behind one interface (`Arc<dyn Chainable<T>>`). Implementors must be `Send + Sync` so a node
/// can be shared across concurrent `process` calls and spawned tasks.
#[async_trait]
pub trait Chainable<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Executes this node. On error the returned `T` is unspecified; callers must not rely on
    /// it beyond what [`Error::input`](crate::Error::input) preserves.
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>>;

    /// This node's identifier, used for error path attribution and live-edit lookup.
    fn name(&self) -> &Name;
}

#[async_trait]
impl<T> Chainable<T> for Arc<dyn Chainable<T>>
where
    T: Send + 'static,
{
    #[inline]
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        (**self).process(ctx, input).await
    }

    #[inline]
    fn name(&self) -> &Name {
        (**self).name()
    }
}
