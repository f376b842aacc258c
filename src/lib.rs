//! A typed, composable processing-pipeline library for resilient request/event handling graphs.
//!
//! `flow-rail` builds graphs out of one contract, [`Chainable`], and two families of node:
//! 1. **Leaf processors** ([`processor`]) — adapt a plain user function (`Transform`, `Apply`,
//!    `Effect`, `MutateIf`) or an error observer (`Handler`) into a [`Chainable`] node.
//! 2. **Composite connectors** ([`connectors`]) — orchestrate children: ordered execution
//!    (`Sequence`), ordered fallback (`Fallback`), first-success racing (`Race`), parallel
//!    aggregation (`Concurrent`), fire-and-forget broadcast (`Scaffold`), deadline bounding
//!    (`Timeout`), attempt repetition (`Retry`), keyed dispatch (`Switch`), conditional gating
//!    (`Filter`), and error observation (`Handle`).
//!
//! Every node receives a [`Context`] (cancellation token plus optional deadline) and returns a
//! structured [`Error<T>`] on failure — never a panic, never a silently swallowed error. A panic
//! inside a user function is trapped at the leaf boundary and reported as [`Cause::Panic`].
//!
//! # Examples
//!
//! ## A sequence with a fallback
//!
//! ```
//! use flow_rail::connectors::{Fallback, Sequence};
//! use flow_rail::processor::{Apply, Transform};
//! use flow_rail::{Chainable, Context};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("primary down")]
//! struct PrimaryDown;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Sequence::new("checkout")
//!         .then(Transform::new("validate", |_: &Context, n: i32| async move { n }))
//!         .then(
//!             Fallback::new("charge")
//!                 .or_else(Apply::new("primary", |_: &Context, _: i32| async move { Err::<i32, _>(PrimaryDown) }))
//!                 .or_else(Transform::new("secondary", |_: &Context, n: i32| async move { n })),
//!         );
//!
//!     assert_eq!(pipeline.process(&Context::background(), 10).await.unwrap(), 10);
//! }
//! ```
//!
//! ## Cancellation propagates to every derived context
//!
//! ```
//! use flow_rail::{Context, Termination};
//!
//! let parent = Context::background();
//! let child = parent.child();
//! parent.cancel();
//! assert_eq!(child.termination(), Some(Termination::Canceled));
//! ```

mod chainable;
mod clone_fn;
mod context;
mod error;
#[macro_use]
mod macros;
mod name;
mod observer;
mod panic_guard;

pub mod connectors;
pub mod processor;
pub mod tracing_ext;

pub use chainable::Chainable;
pub use clone_fn::CloneFn;
pub use context::{Context, Termination};
pub use error::{AggregateMember, Cause, Error, Path};
pub use name::{Name, DEFAULT_ROUTE};
pub use observer::{Event, ObserverFn, Observers};

/// Re-exports the common entry points for a typical `use flow_rail::prelude::*;`.
pub mod prelude {
    pub use crate::connectors::{
        Concurrent, ExponentialBackoff, Fallback, Filter, FixedDelay, Handle, Race, Retry, RetryPolicy,
        Scaffold, Sequence, Switch, Timeout,
    };
    pub use crate::processor::{Apply, Effect, Handler, MutateIf, Transform};
    pub use crate::{Cause, Chainable, Context, Error, Name};
}
