//! [`Sequence`]: an ordered, runtime-mutable chain of steps.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use thiserror::Error as ThisError;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::Error;
use crate::name::Name;

/// Returned by a [`Sequence`] edit operation that targets a step by name when no step with that
/// name exists.
#[derive(Debug, ThisError)]
#[error("no step named {0:?}")]
pub struct NoSuchStep(pub Name);

type Step<T> = Arc<dyn Chainable<T>>;
type Steps<T> = Arc<Vec<Step<T>>>;

/// An ordered, mutable chain of [`Chainable`] steps executed one after another.
///
/// The step list lives behind an [`arc_swap::ArcSwap`]: `process` loads the current snapshot
/// with a single atomic pointer read and runs over it without taking any lock, so concurrent
/// `process` calls never block on a live edit, and a live edit never blocks or interrupts an
/// in-flight `process` call — it simply swaps in a new snapshot that only later calls observe.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Sequence;
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context};
///
/// #[tokio::main]
/// async fn main() {
///     let seq = Sequence::new("pipeline")
///         .then(Transform::new("incr", |_: &Context, n: i32| async move { n + 1 }))
///         .then(Transform::new("double", |_: &Context, n: i32| async move { n * 2 }));
///     assert_eq!(seq.process(&Context::background(), 5).await.unwrap(), 12);
/// }
/// ```
pub struct Sequence<T> {
    name: Name,
    steps: ArcSwap<Vec<Step<T>>>,
}

impl<T> Sequence<T>
where
    T: Send + 'static,
{
    /// Builds a new, empty `Sequence` named `name`.
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), steps: ArcSwap::from_pointee(Vec::new()) }
    }

    /// Builder-style append, for constructing a `Sequence` fluently at startup.
    #[must_use]
    pub fn then(self, step: impl Chainable<T> + 'static) -> Self {
        self.append(step);
        self
    }

    /// Appends `step` to the end of the sequence.
    pub fn append(&self, step: impl Chainable<T> + 'static) {
        self.edit(|steps| steps.push(Arc::new(step)));
    }

    /// Prepends `step` to the start of the sequence.
    pub fn prepend(&self, step: impl Chainable<T> + 'static) {
        self.edit(|steps| steps.insert(0, Arc::new(step)));
    }

    /// Inserts `step` immediately before the first step named `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchStep`] if no step named `target` exists; the sequence is left unchanged.
    pub fn insert_before(
        &self,
        target: &str,
        step: impl Chainable<T> + 'static,
    ) -> Result<(), NoSuchStep> {
        self.edit_fallible(|steps| {
            let idx = Self::find(steps, target)?;
            steps.insert(idx, Arc::new(step));
            Ok(())
        })
    }

    /// Inserts `step` immediately after the first step named `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchStep`] if no step named `target` exists; the sequence is left unchanged.
    pub fn insert_after(
        &self,
        target: &str,
        step: impl Chainable<T> + 'static,
    ) -> Result<(), NoSuchStep> {
        self.edit_fallible(|steps| {
            let idx = Self::find(steps, target)?;
            steps.insert(idx + 1, Arc::new(step));
            Ok(())
        })
    }

    /// Replaces the first step named `target` with `step`.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchStep`] if no step named `target` exists; the sequence is left unchanged.
    pub fn replace(&self, target: &str, step: impl Chainable<T> + 'static) -> Result<(), NoSuchStep> {
        self.edit_fallible(|steps| {
            let idx = Self::find(steps, target)?;
            steps[idx] = Arc::new(step);
            Ok(())
        })
    }

    /// Removes the first step named `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchStep`] if no step named `target` exists; the sequence is left unchanged.
    pub fn remove(&self, target: &str) -> Result<(), NoSuchStep> {
        self.edit_fallible(|steps| {
            let idx = Self::find(steps, target)?;
            steps.remove(idx);
            Ok(())
        })
    }

    /// Removes every step.
    pub fn clear(&self) {
        self.steps.store(Arc::new(Vec::new()));
    }

    /// An ordered snapshot of the current step names.
    pub fn names(&self) -> Vec<Name> {
        self.steps.load().iter().map(|s| s.name().clone()).collect()
    }

    fn find(steps: &[Step<T>], target: &str) -> Result<usize, NoSuchStep> {
        steps
            .iter()
            .position(|s| s.name().as_str() == target)
            .ok_or_else(|| NoSuchStep(Name::new(target)))
    }

    /// Builds a new snapshot from a clone of the current one, applies `f`, then atomically
    /// swaps it in. In-flight readers keep observing the snapshot they already loaded.
    fn edit(&self, f: impl FnOnce(&mut Vec<Step<T>>)) {
        let mut next: Vec<Step<T>> = (**self.steps.load()).clone();
        f(&mut next);
        self.steps.store(Arc::new(next));
    }

    fn edit_fallible<E>(&self, f: impl FnOnce(&mut Vec<Step<T>>) -> Result<(), E>) -> Result<(), E> {
        let mut next: Vec<Step<T>> = (**self.steps.load()).clone();
        f(&mut next)?;
        self.steps.store(Arc::new(next));
        Ok(())
    }

    fn snapshot(&self) -> Steps<T> {
        self.steps.load_full()
    }
}

#[async_trait]
impl<T> Chainable<T> for Sequence<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let steps = self.snapshot();
        let mut value = input;
        for step in steps.iter() {
            match step.process(ctx, value).await {
                Ok(v) => value = v,
                Err(err) => return Err(err.with_prefix(self.name.clone())),
            }
        }
        Ok(value)
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::processor::{Apply, Transform};

    #[derive(Debug, ThisError)]
    #[error("nope")]
    struct Nope;

    #[tokio::test]
    async fn empty_sequence_is_identity() {
        let seq: Sequence<i32> = Sequence::new("empty");
        assert_eq!(seq.process(&Context::background(), 9).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let seq = Sequence::new("seq")
            .then(Transform::new("a", |_: &Context, n: i32| async move { n + 1 }))
            .then(Transform::new("b", |_: &Context, n: i32| async move { n * 10 }));
        assert_eq!(seq.process(&Context::background(), 1).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn failure_halts_and_prepends_name() {
        let seq = Sequence::new("seq").then(Apply::new("fail", |_: &Context, _n: i32| async move {
            Err::<i32, _>(Nope)
        }));
        let err = seq.process(&Context::background(), 1).await.unwrap_err();
        assert_eq!(err.path(), &[Name::new("seq"), Name::new("fail")]);
    }

    #[tokio::test]
    async fn live_edit_append_is_observed_by_next_call_only() {
        let seq: Arc<Sequence<i32>> = Arc::new(Sequence::new("seq"));
        let counter = Arc::new(AtomicU32::new(0));

        let first = {
            let seq = Arc::clone(&seq);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                seq.process(&Context::background(), 1).await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        let counter2 = Arc::clone(&counter);
        seq.append(Transform::new("count", move |_: &Context, n: i32| {
            let counter2 = Arc::clone(&counter2);
            async move {
                counter2.fetch_add(1, Ordering::SeqCst);
                n
            }
        }));

        first.await.unwrap().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0, "in-flight call must not see the appended step");

        seq.process(&Context::background(), 1).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1, "subsequent call must see the appended step");
    }

    #[test]
    fn edit_ops_report_missing_target() {
        let seq: Sequence<i32> = Sequence::new("seq");
        assert!(seq.remove("nope").is_err());
        assert!(seq.replace("nope", Transform::new("x", |_: &Context, n: i32| async move { n })).is_err());
    }

    #[tokio::test]
    async fn names_reflects_insertion_order() {
        let seq = Sequence::new("seq")
            .then(Transform::new("a", |_: &Context, n: i32| async move { n }))
            .then(Transform::new("c", |_: &Context, n: i32| async move { n }));
        seq.insert_before("c", Transform::new("b", |_: &Context, n: i32| async move { n })).unwrap();
        let names: Vec<String> = seq.names().into_iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
