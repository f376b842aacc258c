//! [`Race`]: run every child concurrently, first success wins and cancels the rest.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::chainable::Chainable;
use crate::clone_fn::{CloneFn, Cloner};
use crate::context::Context;
use crate::error::{AggregateMember, Cause, Error};
use crate::name::Name;

/// Runs every child concurrently on its own clone of the input; the first child to succeed
/// wins, and `Race` immediately cancels the remaining siblings via a derived child context. If
/// every child fails, returns an `Error<T>` whose [`Cause::Aggregate`] lists each child's own
/// path and cause.
///
/// `T` must be `Clone` (via [`Race::new`]) or the caller must supply an explicit
/// [`CloneFn`] (via [`Race::with_clone`]) so every spawned child gets an independent copy —
/// no two children ever observe the same mutable instance.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Race;
/// use flow_rail::processor::Apply;
/// use flow_rail::{Chainable, Context};
/// use std::time::Duration;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("slow")]
/// struct TooSlow;
///
/// #[tokio::main]
/// async fn main() {
///     let race = Race::new("race")
///         .or(Apply::new("fast", |_: &Context, n: i32| async move { Ok::<_, TooSlow>(n) }))
///         .or(Apply::new("slow", |_: &Context, n: i32| async move {
///             tokio::time::sleep(Duration::from_millis(50)).await;
///             Ok::<_, TooSlow>(n)
///         }));
///     assert_eq!(race.process(&Context::background(), 1).await.unwrap(), 1);
/// }
/// ```
pub struct Race<T> {
    name: Name,
    children: Vec<Arc<dyn Chainable<T>>>,
    cloner: Cloner<T>,
}

impl<T> Race<T>
where
    T: Clone + Send + 'static,
{
    /// Builds a new, childless `Race` named `name`, cloning inputs via `T::clone`.
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::derive() }
    }
}

impl<T> Race<T>
where
    T: Send + 'static,
{
    /// Builds a new, childless `Race` named `name`, cloning inputs via a user-supplied function.
    pub fn with_clone(name: impl Into<Name>, clone_fn: CloneFn<T>) -> Self {
        Self { name: name.into(), children: Vec::new(), cloner: Cloner::custom(clone_fn) }
    }

    /// Builder-style addition of one more concurrent alternative.
    #[must_use]
    pub fn or(mut self, child: impl Chainable<T> + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Race<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        if self.children.is_empty() {
            return Ok(input);
        }

        let race_ctx = ctx.child();
        let mut set: JoinSet<(Name, Result<T, Error<T>>)> = JoinSet::new();
        for child in &self.children {
            let child = Arc::clone(child);
            let task_ctx = race_ctx.clone();
            let cloned_input = self.cloner.clone_value(&input);
            let child_name = child.name().clone();
            set.spawn(async move { (child_name, child.process(&task_ctx, cloned_input).await) });
        }

        let mut members = Vec::with_capacity(self.children.len());
        while let Some(res) = set.join_next().await {
            match res {
                Ok((_, Ok(value))) => {
                    race_ctx.cancel();
                    set.abort_all();
                    return Ok(value);
                },
                Ok((_, Err(err))) => {
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

        Err(Error::aggregate(self.name.clone(), input, members))
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::processor::Apply;

    #[derive(Debug, thiserror::Error)]
    #[error("fail")]
    struct Fail;

    #[tokio::test]
    async fn fastest_success_wins() {
        let race = Race::new("race")
            .or(Apply::new("fast", |_: &Context, n: i32| async move { Ok::<_, Fail>(n) }))
            .or(Apply::new("slow", |_: &Context, n: i32| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, Fail>(n)
            }));
        let result = race.process(&Context::background(), 1).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn siblings_observe_cancellation_after_winner() {
        let completed = Arc::new(AtomicBool::new(false));
        let completed2 = Arc::clone(&completed);

        let race = Race::new("race")
            .or(Apply::new("fast", |_: &Context, n: i32| async move { Ok::<_, Fail>(n) }))
            .or(Apply::new("slow", move |ctx: &Context, n: i32| {
                let completed2 = Arc::clone(&completed2);
                let token = ctx.token().clone();
                async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(Duration::from_millis(200)) => {
                            completed2.store(true, Ordering::SeqCst);
                        }
                    }
                    Ok::<_, Fail>(n)
                }
            }));

        race.process(&Context::background(), 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!completed.load(Ordering::SeqCst), "slow sibling must not complete after the winner");
    }

    #[tokio::test]
    async fn all_children_fail_aggregates_errors() {
        let race = Race::new("race")
            .or(Apply::new("a", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }))
            .or(Apply::new("b", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }));
        let err = race.process(&Context::background(), 1).await.unwrap_err();
        assert_eq!(err.path(), &[Name::new("race")]);
        assert!(matches!(err.cause(), Cause::Aggregate(members) if members.len() == 2));
    }

    #[tokio::test]
    async fn runs_all_n_children() {
        let count = Arc::new(AtomicU32::new(0));
        let mut race = Race::new("race");
        for _ in 0..5 {
            let count = Arc::clone(&count);
            race = race.or(Apply::new("n", move |_: &Context, n: i32| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, Fail>(n)
                }
            }));
        }
        race.process(&Context::background(), 1).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }
}
