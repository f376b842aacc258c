//! [`Retry`]: re-attempt a single child up to N times, optionally with cancellation-aware
//! backoff between attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::Name;

/// Determines the delay before the next retry attempt, or signals that retrying should stop.
///
/// Implementations are synchronous and stateless per call: [`RetryPolicy::next_delay`] takes the
/// 0-indexed number of attempts already made and returns a fresh decision each time, so a policy
/// instance can be shared across concurrent `Retry::process` calls without any internal mutable
/// state.
pub trait RetryPolicy: Send + Sync {
    /// Returns the delay before the next attempt, or `None` to stop retrying.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Exponential backoff: each retry waits `initial_delay * multiplier^attempt`, capped at
/// `max_delay`, for up to `max_attempts` retries after the first try (so the total number of
/// attempts made is `max_attempts + 1`).
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::ExponentialBackoff;
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::new()
///     .with_initial_delay(Duration::from_millis(100))
///     .with_max_delay(Duration::from_secs(10))
///     .with_max_attempts(5);
/// // Delays: 100ms, 200ms, 400ms, 800ms, 1600ms (capped at 10s), then stop.
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Delay never exceeds this value regardless of attempt number.
    pub max_delay: Duration,
    /// Number of retry attempts allowed after the first try.
    pub max_attempts: u32,
    /// Multiplier applied to the delay after each attempt.
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    #[inline]
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    /// Builds a policy with the default configuration (100ms initial, 30s cap, 5 attempts, 2x
    /// multiplier).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial delay, the base value for the exponential calculation.
    #[inline]
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the cap no computed delay will exceed.
    #[inline]
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the number of retry attempts allowed after the first try.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the multiplier applied to the delay after each failed attempt.
    #[inline]
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    fn compute_delay(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(secs).min(self.max_delay)
    }
}

impl RetryPolicy for ExponentialBackoff {
    #[inline]
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.compute_delay(attempt))
        }
    }
}

/// Fixed delay: the same wait between every retry, for up to `max_attempts` retries after the
/// first try.
#[derive(Clone, Copy, Debug)]
pub struct FixedDelay {
    /// Delay between attempts.
    pub delay: Duration,
    /// Number of retry attempts allowed after the first try.
    pub max_attempts: u32,
}

impl FixedDelay {
    /// Builds a new fixed-delay policy.
    #[inline]
    pub const fn new(delay: Duration, max_attempts: u32) -> Self {
        Self { delay, max_attempts }
    }
}

impl RetryPolicy for FixedDelay {
    #[inline]
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.delay)
        }
    }
}

enum Strategy {
    /// `max_attempts` is the total number of tries (not retries-after-first), matching the
    /// spec's testable property that `Retry::new(child, N)` makes exactly `N` attempts.
    Plain { max_attempts: u32 },
    Backoff(Arc<dyn RetryPolicy>),
}

/// Wraps a single child, re-attempting it on failure.
///
/// [`Retry::new`] re-attempts up to `max_attempts` times total with no delay between attempts.
/// [`Retry::with_backoff`] re-attempts per a [`RetryPolicy`], sleeping (cancellation-aware)
/// between attempts. Either way, the pristine input presented to `Retry` is re-cloned for each
/// attempt — a partially-mutating `Apply` processor never sees a previous attempt's mutation —
/// so `T` must be `Clone`. If all attempts fail, returns the last error with `Retry`'s name
/// prepended and `input` set to the pristine input, not any partial mutation.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Retry;
/// use flow_rail::processor::Apply;
/// use flow_rail::{Chainable, Context};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("not yet")]
/// struct NotYet;
///
/// #[tokio::main]
/// async fn main() {
///     let attempts = Arc::new(AtomicU32::new(0));
///     let attempts2 = Arc::clone(&attempts);
///     let retry = Retry::new(
///         "retry",
///         Apply::new("flaky", move |_: &Context, n: i32| {
///             let attempts2 = Arc::clone(&attempts2);
///             async move {
///                 let count = attempts2.fetch_add(1, Ordering::SeqCst) + 1;
///                 if count < 3 { Err(NotYet) } else { Ok(n) }
///             }
///         }),
///         5,
///     );
///     assert_eq!(retry.process(&Context::background(), 1).await.unwrap(), 1);
///     assert_eq!(attempts.load(Ordering::SeqCst), 3);
/// }
/// ```
pub struct Retry<T> {
    name: Name,
    child: Arc<dyn Chainable<T>>,
    strategy: Strategy,
}

impl<T> Retry<T>
where
    T: Send + 'static,
{
    /// Re-attempts `child` up to `max_attempts` times total, with no delay between attempts.
    pub fn new(name: impl Into<Name>, child: impl Chainable<T> + 'static, max_attempts: u32) -> Self {
        Self {
            name: name.into(),
            child: Arc::new(child),
            strategy: Strategy::Plain { max_attempts: max_attempts.max(1) },
        }
    }

    /// Re-attempts `child` per `policy`, sleeping between attempts.
    pub fn with_backoff(
        name: impl Into<Name>,
        child: impl Chainable<T> + 'static,
        policy: impl RetryPolicy + 'static,
    ) -> Self {
        Self { name: name.into(), child: Arc::new(child), strategy: Strategy::Backoff(Arc::new(policy)) }
    }
}

#[async_trait]
impl<T> Chainable<T> for Retry<T>
where
    T: Clone + Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let pristine = input;
        let mut attempt: u32 = 0;

        loop {
            if ctx.is_canceled() {
                return Err(Error::new::<std::convert::Infallible>(
                    self.name.clone(),
                    pristine,
                    Cause::Canceled,
                )
                .with_canceled(true));
            }

            let attempt_input = pristine.clone();
            let result = self.child.process(ctx, attempt_input).await;
            attempt += 1;

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let delay = match &self.strategy {
                Strategy::Plain { max_attempts } => {
                    if attempt < *max_attempts {
                        Some(Duration::ZERO)
                    } else {
                        None
                    }
                },
                Strategy::Backoff(policy) => policy.next_delay(attempt - 1),
            };

            let Some(delay) = delay else {
                return Err(err.with_prefix(self.name.clone()));
            };

            if delay > Duration::ZERO {
                tokio::select! {
                    () = ctx.token().cancelled() => {
                        return Err(Error::new::<std::convert::Infallible>(
                            self.name.clone(),
                            pristine,
                            Cause::Canceled,
                        )
                        .with_canceled(true));
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::processor::Apply;

    #[derive(Debug, thiserror::Error)]
    #[error("always fails")]
    struct AlwaysFails;

    #[tokio::test]
    async fn exhausts_exactly_n_attempts() {
        let count = Arc::new(AtomicU32::new(0));
        let count2 = Arc::clone(&count);
        let retry = Retry::new(
            "retry",
            Apply::new("fail", move |_: &Context, n: i32| {
                let count2 = Arc::clone(&count2);
                async move {
                    count2.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(AlwaysFails)
                }
            }),
            3,
        );
        let err = retry.process(&Context::background(), 1).await.unwrap_err();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(err.path(), &[Name::new("retry"), Name::new("fail")]);
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let count = Arc::new(AtomicU32::new(0));
        let count2 = Arc::clone(&count);
        let retry = Retry::new(
            "retry",
            Apply::new("flaky", move |_: &Context, n: i32| {
                let count2 = Arc::clone(&count2);
                async move {
                    let c = count2.fetch_add(1, Ordering::SeqCst) + 1;
                    if c < 3 { Err(AlwaysFails) } else { Ok(n) }
                }
            }),
            5,
        );
        retry.process(&Context::background(), 1).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn input_presented_to_retry_is_preserved_on_failure() {
        let retry = Retry::new(
            "retry",
            Apply::new("mutate-then-fail", |_: &Context, n: i32| async move { Err::<i32, _>(AlwaysFails) }),
            2,
        );
        let err = retry.process(&Context::background(), 42).await.unwrap_err();
        assert_eq!(*err.input(), 42);
    }

    #[tokio::test]
    async fn backoff_sleeps_between_attempts_and_respects_cancellation() {
        let retry = Retry::with_backoff(
            "retry",
            Apply::new("fail", |_: &Context, _: i32| async move { Err::<i32, _>(AlwaysFails) }),
            FixedDelay::new(Duration::from_secs(10), 3),
        );
        let ctx = Context::background();
        let token = ctx.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let start = std::time::Instant::now();
        let err = retry.process(&ctx, 1).await.unwrap_err();
        assert!(start.elapsed() < Duration::from_millis(200));
        assert!(err.is_canceled());
    }
}
