//! Execution-scoped cancellation and deadline carrier.
//!
//! Every [`Chainable::process`](crate::Chainable::process) call receives a [`Context`]. It bundles
//! a [`CancellationToken`] with an optional absolute deadline; connectors that fan out
//! (`Race`, `Concurrent`, `Scaffold`, `Timeout`) derive a [`Context::child`] so that canceling
//! the fan-out's own work never reaches back up to the caller's token.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] is already terminated, as reported by [`Context::termination`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    /// The token was explicitly canceled.
    Canceled,
    /// The deadline has already passed.
    Timeout,
}

/// The execution-scoped carrier of a [`CancellationToken`] and an optional deadline.
///
/// `Context` is cheap to clone (an `Arc`-backed token plus a `Copy` instant) and is threaded
/// by reference through every `process` call. It does not itself race a sleep against the
/// deadline — that is [`Timeout`](crate::connectors::Timeout)'s job; `Context` is a plain data
/// carrier queried at leaf boundaries.
#[derive(Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A fresh context with no deadline and a new, uncanceled token.
    #[inline]
    pub fn background() -> Self {
        Self { token: CancellationToken::new(), deadline: None }
    }

    /// A fresh context whose deadline is `now + d`.
    #[inline]
    pub fn with_timeout(d: Duration) -> Self {
        Self { token: CancellationToken::new(), deadline: Some(Instant::now() + d) }
    }

    /// Wraps an existing token with no deadline, for callers that already manage their own
    /// cancellation source (e.g. a process-wide shutdown token).
    #[inline]
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Derives a child context for a fan-out connector: a child token that can be canceled
    /// independently (e.g. by [`Race`](crate::connectors::Race) on first success) without
    /// affecting `self`'s token, inheriting `self`'s deadline unchanged.
    #[inline]
    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    /// Derives a detached child context: a child token (still canceled transitively if a
    /// process-wide root cancels) but with the caller's deadline dropped, for
    /// [`Scaffold`](crate::connectors::Scaffold)'s fire-and-forget children.
    #[inline]
    pub fn detached_child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: None }
    }

    /// Replaces the deadline with `now + d`, keeping the same token lineage. Used by
    /// [`Timeout`](crate::connectors::Timeout) to build the context it runs its child under.
    #[inline]
    #[must_use]
    pub fn with_deadline_in(mut self, d: Duration) -> Self {
        self.deadline = Some(Instant::now() + d);
        self
    }

    /// The underlying cancellation token, for connectors that need to race it directly
    /// (`tokio::select!` against [`CancellationToken::cancelled`]).
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The absolute deadline, if any.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` if the token has been canceled.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `true` if a deadline is set and has already passed.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Cancels this context's token, reaching every child context derived from it.
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Reports why the context is already terminated, if it is.
    ///
    /// Checks cancellation before expiry: an explicitly canceled token takes precedence over
    /// an incidentally-passed deadline, matching how [`Timeout`](crate::connectors::Timeout)
    /// cancels its child token the moment its own sleep race fires.
    #[inline]
    pub fn termination(&self) -> Option<Termination> {
        if self.is_canceled() {
            Some(Termination::Canceled)
        } else if self.is_expired() {
            Some(Termination::Timeout)
        } else {
            None
        }
    }
}

impl Default for Context {
    #[inline]
    fn default() -> Self {
        Self::background()
    }
}
