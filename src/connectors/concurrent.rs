//! [`Concurrent`]: a parallel broadcast that runs every child on a cloned input.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::chainable::Chainable;
use crate::clone_fn::{CloneFn, Cloner};
use crate::context::Context;
use crate::error::{AggregateMember, Cause, Error};
use crate::name::Name;

/// A reducer that folds every child's output (ordered by declared child index, not completion
/// order) into a single `T`.
pub type Reducer<T> = Arc<dyn Fn(Vec<T>) -> T + Send + Sync>;

/// Runs every child concurrently, each on its own clone of the input, and waits for all of them
/// to finish.
///
/// With a [`Reducer`] attached (via [`Concurrent::reduce`]), the reducer receives every child's
/// output in declared order and folds them into one `T`. Without one, `Concurrent` is a
/// "fire-and-gather" node: every child must succeed, their outputs are discarded, and the
/// original input is returned unchanged. Any child failure — with or without a reducer —
/// aggregates into a single `Error<T>` (`Cause::Aggregate`) listing every failed child's path
/// and cause; cancellation propagates from the parent context to every child, but unlike
/// [`Race`](crate::connectors::Race), a child's success never cancels its siblings.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Concurrent;
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let gather = Concurrent::new("fan-out")
///         .with(Transform::new("a", |_: &Context, n: i32| async move { n }))
///         .with(Transform::new("b", |_: &Context, n: i32| async move { n }));
///     assert_eq!(gather.process(&Context::background(), 7).await.unwrap(), 7);
///
///     let sum = Concurrent::new("fan-out-sum")
///         .with(Transform::new("a", |_: &Context, n: i32| async move { n }))
///         .with(Transform::new("b", |_: &Context, n: i32| async move { n * 2 }))
///         .reduce(Arc::new(|outputs: Vec<i32>| outputs.into_iter().sum()));
///     assert_eq!(sum.process(&Context::background(), 3).await.unwrap(), 3 + 6);
/// }
/// ```
pub struct Concurrent<T> {
    name: Name,
    children: Vec<Arc<dyn Chainable<T>>>,
    cloner: Cloner<T>,
    reducer: Option<Reducer<T>>,
}

impl<T> Concurrent<T>
where
    T: Clone + Send + 'static,
{
    /// Builds a new, childless `Concurrent` named `name`, cloning inputs via `T::clone`.
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::derive(), reducer: None }
    }
}

impl<T> Concurrent<T>
where
    T: Send + 'static,
{
    /// Builds a new, childless `Concurrent` named `name`, cloning inputs via a user-supplied
    /// function.
    pub fn with_clone(name: impl Into<Name>, clone_fn: CloneFn<T>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::custom(clone_fn), reducer: None }
    }

    /// Builder-style addition of one more concurrent child.
    #[must_use]
    pub fn with(mut self, child: impl Chainable<T> + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Attaches a reducer; without one, `Concurrent` discards outputs and returns the original
    /// input on full success.
    #[must_use]
    pub fn reduce(mut self, reducer: Reducer<T>) -> Self {
        self.reducer = Some(reducer);
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Concurrent<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        if self.children.is_empty() {
            return Ok(input);
        }

        let fan_ctx = ctx.child();
        let mut set: JoinSet<(usize, Result<T, Error<T>>)> = JoinSet::new();
        for (idx, child) in self.children.iter().enumerate() {
            let child = Arc::clone(child);
            let task_ctx = fan_ctx.clone();
            let cloned_input = self.cloner.clone_value(&input);
            set.spawn(async move { (idx, child.process(&task_ctx, cloned_input).await) });
        }

        let mut outputs: Vec<Option<T>> = (0..self.children.len()).map(|_| None).collect();
        let mut members = Vec::new();
        while let Some(res) = set.join_next().await {
            match res {
                Ok((idx, Ok(value))) => outputs[idx] = Some(value),
                Ok((idx, Err(err))) => {
                    let _ = idx;
                    let (path, cause) = err.into_path_and_cause();
                    members.push(AggregateMember { path, cause });
                },
                Err(join_err) => {
                    members.push(AggregateMember {
                        path: [Name::new("<unknown>")].into_iter().collect(),
                        cause: Cause::Panic(join_err.to_string()),
                    });
                },
            }
        }

        if !members.is_empty() {
            return Err(Error::aggregate(self.name.clone(), input, members));
        }

        let outputs: Vec<T> =
            outputs.into_iter().map(|o| o.expect("no errors means every slot was filled")).collect();
        match &self.reducer {
            Some(reduce) => Ok(reduce(outputs)),
            None => Ok(input),
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
    #[error("fail")]
    struct Fail;

    #[tokio::test]
    async fn all_n_children_run() {
        let count = Arc::new(AtomicU32::new(0));
        let mut gather = Concurrent::new("fan-out");
        for _ in 0..4 {
            let count = Arc::clone(&count);
            gather = gather.with(Apply::new("n", move |_: &Context, n: i32| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Fail>(n)
                }
            }));
        }
        gather.process(&Context::background(), 1).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn no_child_mutation_leaks_across_clones() {
        #[derive(Clone)]
        struct Bag(Vec<i32>);

        let gather = Concurrent::new("fan-out")
            .with(Apply::new("a", |_: &Context, mut b: Bag| async move {
                b.0.push(1);
                Ok::<_, Fail>(b)
            }))
            .with(Apply::new("b", |_: &Context, mut b: Bag| async move {
                b.0.push(2);
                Ok::<_, Fail>(b)
            }))
            .reduce(Arc::new(|outputs: Vec<Bag>| {
                let mut merged = Vec::new();
                for o in outputs {
                    merged.extend(o.0);
                }
                Bag(merged)
            }));

        let original = Bag(vec![0]);
        let result = gather.process(&Context::background(), original.clone()).await.unwrap();
        assert_eq!(original.0, vec![0], "caller's input must not be mutated by any child");
        assert_eq!(result.0, vec![0, 1, 0, 2]);
    }

    #[tokio::test]
    async fn without_reducer_returns_original_input() {
        let gather = Concurrent::new("fan-out")
            .with(Apply::new("a", |_: &Context, n: i32| async move { Ok::<_, Fail>(n * 100) }));
        assert_eq!(gather.process(&Context::background(), 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn any_failure_aggregates() {
        let gather = Concurrent::new("fan-out")
            .with(Apply::new("a", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }))
            .with(Apply::new("b", |_: &Context, n: i32| async move { Ok::<_, Fail>(n) }));
        let err = gather.process(&Context::background(), 1).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::Aggregate(members) if members.len() == 1));
    }
}
