//! Leaf [`Chainable`](crate::Chainable) adapters that wrap a user function.
//!
//! Five variants cover the shapes a user function can take: [`Apply`] (may mutate or reject),
//! [`Transform`] (cannot fail), [`Effect`] (side effect or validation, pass-through on success),
//! [`MutateIf`] (predicate-gated transform), and [`Handler`] (operates on an [`Error<T>`] rather
//! than `T`, used only by [`Handle`](crate::connectors::Handle)).

mod apply;
mod effect;
mod handler;
mod mutate_if;
mod transform;

pub use apply::Apply;
pub use effect::Effect;
pub use handler::Handler;
pub use mutate_if::MutateIf;
pub use transform::Transform;
