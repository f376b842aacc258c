//! Composite [`Chainable`](crate::Chainable) connectors that orchestrate child nodes.
//!
//! Each connector implements exactly the orchestration semantics named in its module: ordered
//! execution ([`Sequence`]), ordered attempts ([`Fallback`]), parallel race-to-first-success
//! ([`Race`]), parallel broadcast-and-aggregate ([`Concurrent`]), fire-and-forget broadcast
//! ([`Scaffold`]), deadline bounding ([`Timeout`]), attempt repetition ([`Retry`]), keyed routing
//! ([`Switch`]), conditional execution ([`Filter`]), and error observation ([`Handle`]).

mod concurrent;
mod fallback;
mod filter;
mod handle;
mod race;
mod retry;
mod scaffold;
mod sequence;
mod switch;
mod timeout;

pub use concurrent::Concurrent;
pub use fallback::Fallback;
pub use filter::Filter;
pub use handle::Handle;
pub use race::Race;
pub use retry::{ExponentialBackoff, FixedDelay, Retry, RetryPolicy};
pub use scaffold::Scaffold;
pub use sequence::Sequence;
pub use switch::Switch;
pub use timeout::Timeout;
