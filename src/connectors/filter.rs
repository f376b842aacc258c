//! [`Filter`]: conditionally run a single child, passing through otherwise.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;
use crate::observer::{Event, ObserverFn, Observers};

/// A synchronous predicate over the execution context and the input.
pub type Predicate<T> = Arc<dyn Fn(&Context, &T) -> bool + Send + Sync>;

/// Gates a single child behind a predicate. When the predicate is `true`, `Filter` runs the
/// child and returns its result (errors get `Filter`'s name prepended); when `false`, the input
/// passes through unchanged, the child never runs, and no error is possible. The predicate
/// itself is synchronous and infallible, intended for cheap, local gating decisions (feature
/// flags, conditional enrichment) rather than an I/O round-trip.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Filter;
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let filter = Filter::new(
///         "only-positive",
///         Arc::new(|_: &Context, n: &i32| *n > 0),
///         Transform::new("double", |_: &Context, n: i32| async move { n * 2 }),
///     );
///     assert_eq!(filter.process(&Context::background(), 5).await.unwrap(), 10);
///     assert_eq!(filter.process(&Context::background(), -5).await.unwrap(), -5);
/// }
/// ```
pub struct Filter<T> {
    name: Name,
    predicate: Predicate<T>,
    child: Arc<dyn Chainable<T>>,
    observers: Observers,
}

impl<T> Filter<T>
where
    T: Send + 'static,
{
    /// Builds a `Filter` named `name` that runs `child` only when `predicate` returns `true`.
    pub fn new(name: impl Into<Name>, predicate: Predicate<T>, child: impl Chainable<T> + 'static) -> Self {
        Self { name: name.into(), predicate, child: Arc::new(child), observers: Observers::new() }
    }

    /// Registers an observer notified with `"filter-passed"` or `"filter-skipped"` on every
    /// `process` call, off the critical path.
    #[must_use]
    pub fn on_event(self, callback: ObserverFn) -> Self {
        self.observers.subscribe(callback);
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Filter<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        if (self.predicate)(ctx, &input) {
            self.observers.notify(Event { connector: self.name.clone(), kind: "filter-passed", detail: None });
            self.child.process(ctx, input).await.map_err(|err| err.with_prefix(self.name.clone()))
        } else {
            self.observers.notify(Event { connector: self.name.clone(), kind: "filter-skipped", detail: None });
            Ok(input)
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Apply;

    #[derive(Debug, thiserror::Error)]
    #[error("fail")]
    struct Fail;

    #[tokio::test]
    async fn true_predicate_runs_child() {
        let filter = Filter::new(
            "f",
            Arc::new(|_: &Context, _: &i32| true),
            Apply::new("double", |_: &Context, n: i32| async move { Ok::<_, Fail>(n * 2) }),
        );
        assert_eq!(filter.process(&Context::background(), 5).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn false_predicate_passes_through_without_running_child() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = Arc::clone(&ran);
        let filter = Filter::new(
            "f",
            Arc::new(|_: &Context, _: &i32| false),
            Apply::new("mark", move |_: &Context, n: i32| {
                let ran2 = Arc::clone(&ran2);
                async move {
                    ran2.store(true, Ordering::SeqCst);
                    Ok::<_, Fail>(n)
                }
            }),
        );
        assert_eq!(filter.process(&Context::background(), 5).await.unwrap(), 5);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn child_error_is_prefixed() {
        let filter = Filter::new(
            "f",
            Arc::new(|_: &Context, _: &i32| true),
            Apply::new("boom", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }),
        );
        let err = filter.process(&Context::background(), 5).await.unwrap_err();
        assert_eq!(err.path(), &[Name::new("f"), Name::new("boom")]);
    }
}
