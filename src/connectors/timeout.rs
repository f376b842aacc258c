//! [`Timeout`]: bound a single child's execution by a wall-clock budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::Name;

/// Wraps a single child with a deadline. `Timeout` derives a context with deadline `now + d`,
/// races the child against a `tokio::time::sleep(d)`, and:
///
/// - if the child finishes first, returns its result **verbatim** — `Timeout` does not prepend
///   its own name on a child error in this case, since the child completed within budget;
/// - if the deadline fires first, returns a fresh `Error<T>` with `cause = Cause::Timeout(d)`,
///   `timeout = true`, `canceled = true`, `path = [timeout.name]`, and cancels the context the
///   child is still running under. `Timeout` does not kill a non-cooperating child — it simply
///   stops waiting and drops its side of the race.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Timeout;
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let bounded = Timeout::new(
///         "bounded",
///         Duration::from_millis(50),
///         Transform::new("slow", |_: &Context, n: i32| async move {
///             tokio::time::sleep(Duration::from_millis(500)).await;
///             n
///         }),
///     );
///     let err = bounded.process(&Context::background(), 1).await.unwrap_err();
///     assert!(err.is_timeout());
/// }
/// ```
pub struct Timeout<T> {
    name: Name,
    duration: Duration,
    child: Arc<dyn Chainable<T>>,
}

impl<T> Timeout<T>
where
    T: Send + 'static,
{
    /// Wraps `child` in a `Timeout` named `name`, bounded by `duration`.
    pub fn new(name: impl Into<Name>, duration: Duration, child: impl Chainable<T> + 'static) -> Self {
        Self { name: name.into(), duration, child: Arc::new(child) }
    }
}

#[async_trait]
impl<T> Chainable<T> for Timeout<T>
where
    T: Clone + Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let observed = input.clone();
        let deadline_ctx = ctx.child().with_deadline_in(self.duration);
        let token = deadline_ctx.token().clone();

        tokio::select! {
            biased;
            result = self.child.process(&deadline_ctx, input) => result,
            () = tokio::time::sleep(self.duration) => {
                token.cancel();
                Err(Error::new(
                    self.name.clone(),
                    observed,
                    Cause::<std::convert::Infallible>::Timeout(self.duration),
                ))
            }
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::processor::Apply;

    #[derive(Debug, thiserror::Error)]
    #[error("fail")]
    struct Fail;

    #[tokio::test]
    async fn fast_child_result_passes_through_verbatim() {
        let t = Timeout::new(
            "t",
            Duration::from_millis(100),
            Apply::new("fast", |_: &Context, n: i32| async move { Ok::<_, Fail>(n) }),
        );
        assert_eq!(t.process(&Context::background(), 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fast_child_error_is_not_wrapped() {
        let t = Timeout::new(
            "t",
            Duration::from_millis(100),
            Apply::new("fast", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }),
        );
        let err = t.process(&Context::background(), 1).await.unwrap_err();
        assert_eq!(err.path(), &[Name::new("fast")]);
    }

    #[tokio::test]
    async fn slow_child_times_out() {
        let t = Timeout::new(
            "t",
            Duration::from_millis(50),
            Apply::new("slow", |_: &Context, n: i32| async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, Fail>(n)
            }),
        );
        let start = Instant::now();
        let err = t.process(&Context::background(), 9).await.unwrap_err();
        assert!(start.elapsed() < Duration::from_millis(150));
        assert!(err.is_timeout());
        assert!(err.is_canceled());
        assert_eq!(err.path(), &[Name::new("t")]);
        assert_eq!(*err.input(), 9);
    }
}
