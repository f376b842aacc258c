//! The structured error value every [`Chainable`](crate::Chainable) surfaces on failure.
//!
//! [`Error<T>`] is a tagged struct, not an exception hierarchy: every failure
//! the core produces carries the traversal path that reached it, the input
//! that was being processed, a classified [`Cause`], and enough timing
//! information for a caller to make retry decisions.

use std::fmt;
use std::time::{Duration, SystemTime};

use smallvec::SmallVec;
use thiserror::Error as ThisError;

use crate::name::Name;

/// Ordered list of [`Name`]s from the outermost connector down to the
/// failing processor.
///
/// Backed by a `SmallVec` with inline storage for four entries — the common
/// case of a handful of nested connectors never allocates. Mirrors the
/// `ErrorVec<E> = SmallVec<[E; 2]>` collection the crate's predecessor used
/// for accumulated error context.
pub type Path = SmallVec<[Name; 4]>;

/// The classified reason a [`Chainable`] failed.
///
/// `Cause` is deliberately small and closed over the failure modes the core
/// itself introduces; a user's own domain error rides along unmodified in
/// [`Cause::Domain`].
#[derive(Debug, ThisError)]
pub enum Cause<E> {
    /// The user's processor function returned an error.
    #[error("domain error: {0}")]
    Domain(E),

    /// The execution context was canceled before or during this node's work.
    #[error("canceled")]
    Canceled,

    /// A [`Timeout`](crate::connectors::Timeout) connector's deadline fired before the child
    /// returned.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A [`Switch`](crate::connectors::Switch) connector had no route for the key and no
    /// `"default"` fallback.
    #[error("no route for key {0:?}")]
    NoRoute(Name),

    /// All children of a [`Race`](crate::connectors::Race) or
    /// [`Concurrent`](crate::connectors::Concurrent) connector failed; this wraps each child's
    /// own [`Error<T>`], addressed generically here as a boxed list to avoid recursive type
    /// parameters bleeding into `Cause` itself.
    #[error("{} children failed", .0.len())]
    Aggregate(Vec<AggregateMember<E>>),

    /// A leaf processor or a composite connector's internal task panicked.
    #[error("panic: {0}")]
    Panic(String),
}

/// One failed child's contribution to a [`Cause::Aggregate`].
///
/// Carries only what is needed for diagnostics without requiring `Cause` (and
/// thus `Error<T>`) to reference itself recursively by value.
#[derive(Debug)]
pub struct AggregateMember<E> {
    /// The failing child's traversal path, relative to the aggregating connector.
    pub path: Path,
    /// The failing child's cause.
    pub cause: Cause<E>,
}

impl<E: fmt::Display> fmt::Display for AggregateMember<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .path
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join(" > ");
        write!(f, "{joined}: {}", self.cause)
    }
}

/// A structured failure produced by a [`Chainable`](crate::Chainable) node.
///
/// `Error<T>` is the *only* error type the core ever surfaces; composite
/// connectors never discard it, they only prepend their own [`Name`] to
/// [`Error::path`] as it bubbles outward.
pub struct Error<T> {
    path: Path,
    input: T,
    cause: Cause<Box<dyn std::error::Error + Send + Sync + 'static>>,
    timestamp: SystemTime,
    elapsed: Duration,
    timeout: bool,
    canceled: bool,
}

impl<T> Error<T> {
    /// Builds a new error rooted at `name`, carrying the `input` observed at
    /// the failing node's entry and a caller-supplied `cause`.
    ///
    /// `timeout`/`canceled` are derived automatically from the `cause` variant
    /// for [`Cause::Timeout`] and [`Cause::Canceled`]; other causes start with
    /// both flags clear.
    pub fn new<E>(name: Name, input: T, cause: Cause<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let (timeout, canceled) = match &cause {
            Cause::Timeout(_) => (true, true),
            Cause::Canceled => (false, true),
            _ => (false, false),
        };
        let cause = map_cause_boxed(cause);
        let mut path = Path::new();
        path.push(name);
        Self { path, input, cause, timestamp: SystemTime::now(), elapsed: Duration::ZERO, timeout, canceled }
    }

    /// Records how long the failing node ran before returning this error.
    #[inline]
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Forces the `canceled` flag, used when a connector observes
    /// cancellation independent of the child's own cause classification.
    #[inline]
    #[must_use]
    pub fn with_canceled(mut self, canceled: bool) -> Self {
        self.canceled = canceled;
        self
    }

    /// Prepends `name` to the traversal path.
    ///
    /// Called by every composite connector exactly once as an error bubbles
    /// through it, so [`Error::path`] always reflects the actual nesting at
    /// the moment of failure (outermost connector first).
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, name: Name) -> Self {
        self.path.insert(0, name);
        self
    }

    /// The ordered traversal path, outermost connector first.
    #[inline]
    pub fn path(&self) -> &[Name] {
        &self.path
    }

    /// The value of `T` observed at the failing node's entry.
    #[inline]
    pub fn input(&self) -> &T {
        &self.input
    }

    /// Consumes the error, returning the input it carried.
    #[inline]
    pub fn into_input(self) -> T {
        self.input
    }

    /// The classified cause of the failure.
    #[inline]
    pub fn cause(&self) -> &Cause<Box<dyn std::error::Error + Send + Sync + 'static>> {
        &self.cause
    }

    /// `true` if this error originated from (or was propagated alongside) a
    /// deadline expiry.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.timeout
    }

    /// `true` if this error originated from (or was propagated alongside)
    /// explicit cancellation.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// When this error was recorded.
    #[inline]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// How long the failing node ran before returning this error.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Decomposes the error into its path and boxed cause, discarding input/timing metadata.
    ///
    /// Used by [`Race`](crate::connectors::Race) and [`Concurrent`](crate::connectors::Concurrent)
    /// to fold a failed child's error into a [`Cause::Aggregate`] member without re-boxing an
    /// already-boxed cause.
    pub(crate) fn into_path_and_cause(self) -> (Path, Cause<Box<dyn std::error::Error + Send + Sync + 'static>>) {
        (self.path, self.cause)
    }

    /// Builds an `Error<T>` directly from a pre-built [`Cause::Aggregate`] whose members already
    /// carry boxed causes, skipping the generic boxing [`Error::new`] performs.
    pub(crate) fn aggregate(
        name: Name,
        input: T,
        members: Vec<AggregateMember<Box<dyn std::error::Error + Send + Sync + 'static>>>,
    ) -> Self {
        let mut path = Path::new();
        path.push(name);
        Self {
            path,
            input,
            cause: Cause::Aggregate(members),
            timestamp: SystemTime::now(),
            elapsed: Duration::ZERO,
            timeout: false,
            canceled: false,
        }
    }
}

fn map_cause_boxed<E>(cause: Cause<E>) -> Cause<Box<dyn std::error::Error + Send + Sync + 'static>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match cause {
        Cause::Domain(e) => Cause::Domain(Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        Cause::Canceled => Cause::Canceled,
        Cause::Timeout(d) => Cause::Timeout(d),
        Cause::NoRoute(n) => Cause::NoRoute(n),
        Cause::Panic(p) => Cause::Panic(p),
        Cause::Aggregate(members) => Cause::Aggregate(
            members
                .into_iter()
                .map(|m| AggregateMember { path: m.path, cause: map_cause_boxed(m.cause) })
                .collect(),
        ),
    }
}

impl<T> fmt::Debug for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("path", &self.path)
            .field("cause", &self.cause)
            .field("timeout", &self.timeout)
            .field("canceled", &self.canceled)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.path.iter().map(Name::as_str).collect::<Vec<_>>().join(" > ");
        write!(f, "{joined}: {}", self.cause)
    }
}

impl<T: fmt::Debug> std::error::Error for Error<T> {}

/// Builds a [`Cause::Domain`]-rooted [`Error`] from a processor's failing
/// result, flagging `timeout`/`canceled` from the execution [`Context`](crate::Context) if it
/// was already terminated when the processor returned.
pub(crate) fn domain_error<T, E>(
    name: Name,
    input: T,
    err: E,
    ctx_canceled: bool,
    ctx_timed_out: bool,
) -> Error<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::new(name, input, Cause::Domain(err))
        .with_canceled(ctx_canceled)
        .with_elapsed(Duration::ZERO)
        .map_timeout_flag(ctx_timed_out)
}

impl<T> Error<T> {
    fn map_timeout_flag(mut self, timed_out: bool) -> Self {
        self.timeout = self.timeout || timed_out;
        self
    }
}
