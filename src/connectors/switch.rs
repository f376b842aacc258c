//! [`Switch`]: route to one of several children by a key derived from the input.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::chainable::Chainable;
use crate::context::Context;
use crate::error::{Cause, Error};
use crate::name::{Name, DEFAULT_ROUTE};
use crate::observer::{Event, ObserverFn, Observers};

/// A synchronous function that derives a routing key from the input.
pub type KeyFn<T> = Arc<dyn Fn(&Context, &T) -> Name + Send + Sync>;

/// Routes to one of several named children by a key function evaluated on each `process` call.
///
/// Routes live behind a [`RwLock`]; [`Switch::add_route`] can be called at any time, consistent
/// with [`Sequence`](crate::connectors::Sequence)'s live-edit discipline, but the table is best
/// treated as conceptually frozen after the first `process` call — an in-flight call only ever
/// observes the route snapshot it read at its own key lookup, never a route added afterward.
/// A key with no matching route falls back to whatever is registered under
/// [`DEFAULT_ROUTE`]; with neither, `process` returns a [`Cause::NoRoute`] error.
///
/// # Examples
///
/// ```
/// use flow_rail::connectors::Switch;
/// use flow_rail::processor::Transform;
/// use flow_rail::{Chainable, Context, Name};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let switch = Switch::new("parity", Arc::new(|_: &Context, n: &i32| {
///         Name::new(if n % 2 == 0 { "even" } else { "odd" })
///     }))
///     .with_route("even", Transform::new("even", |_: &Context, n: i32| async move { n * 10 }))
///     .with_route("odd", Transform::new("odd", |_: &Context, n: i32| async move { n * -1 }));
///
///     assert_eq!(switch.process(&Context::background(), 4).await.unwrap(), 40);
///     assert_eq!(switch.process(&Context::background(), 3).await.unwrap(), -3);
/// }
/// ```
pub struct Switch<T> {
    name: Name,
    key_fn: KeyFn<T>,
    routes: RwLock<HashMap<Name, Arc<dyn Chainable<T>>>>,
    observers: Observers,
}

impl<T> Switch<T>
where
    T: Send + 'static,
{
    /// Builds a new `Switch` named `name` with no registered routes.
    pub fn new(name: impl Into<Name>, key_fn: KeyFn<T>) -> Self {
        Self { name: name.into(), key_fn, routes: RwLock::new(HashMap::new()), observers: Observers::new() }
    }

    /// Registers `child` under `route_name`, replacing any existing route of the same name.
    ///
    /// Takes `&self`, matching [`Sequence::append`](crate::connectors::Sequence::append) — a
    /// route can be added at runtime through a shared `Arc<Switch<T>>` with no exclusive access.
    /// Use [`Switch::with_route`] to register routes fluently at construction time instead.
    pub fn add_route(&self, route_name: impl Into<Name>, child: impl Chainable<T> + 'static) {
        self.routes.write().expect("route table lock poisoned").insert(route_name.into(), Arc::new(child));
    }

    /// Builder-style registration for fluent composition right after [`Switch::new`].
    #[must_use]
    pub fn with_route(self, route_name: impl Into<Name>, child: impl Chainable<T> + 'static) -> Self {
        self.add_route(route_name, child);
        self
    }

    /// An unordered snapshot of the currently registered route names.
    pub fn routes(&self) -> Vec<Name> {
        self.routes.read().expect("route table lock poisoned").keys().cloned().collect()
    }

    /// Registers an observer notified with `"switch-routed"` (carrying the matched key as
    /// `detail`) or `"switch-no-route"` on every `process` call, off the critical path.
    #[must_use]
    pub fn on_event(self, callback: ObserverFn) -> Self {
        self.observers.subscribe(callback);
        self
    }
}

#[async_trait]
impl<T> Chainable<T> for Switch<T>
where
    T: Send + 'static,
{
    async fn process(&self, ctx: &Context, input: T) -> Result<T, Error<T>> {
        let key = (self.key_fn)(ctx, &input);
        let child = {
            let routes = self.routes.read().expect("route table lock poisoned");
            routes.get(&key).or_else(|| routes.get(&Name::new(DEFAULT_ROUTE))).cloned()
        };

        match child {
            Some(child) => {
                self.observers.notify(Event {
                    connector: self.name.clone(),
                    kind: "switch-routed",
                    detail: Some(key.clone()),
                });
                child.process(ctx, input).await.map_err(|err| err.with_prefix(self.name.clone()))
            },
            None => {
                self.observers.notify(Event {
                    connector: self.name.clone(),
                    kind: "switch-no-route",
                    detail: Some(key.clone()),
                });
                Err(Error::new::<std::convert::Infallible>(self.name.clone(), input, Cause::NoRoute(key)))
            },
        }
    }

    fn name(&self) -> &Name {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Transform;

    fn parity_key() -> KeyFn<i32> {
        Arc::new(|_: &Context, n: &i32| Name::new(if n % 2 == 0 { "even" } else { "odd" }))
    }

    #[tokio::test]
    async fn routes_to_matching_key() {
        let switch = Switch::new("s", parity_key())
            .with_route("even", Transform::new("even", |_: &Context, n: i32| async move { n * 10 }))
            .with_route("odd", Transform::new("odd", |_: &Context, n: i32| async move { n * -1 }));
        assert_eq!(switch.process(&Context::background(), 4).await.unwrap(), 40);
        assert_eq!(switch.process(&Context::background(), 3).await.unwrap(), -3);
    }

    #[tokio::test]
    async fn falls_back_to_default_route() {
        let switch = Switch::new("s", parity_key())
            .with_route("even", Transform::new("even", |_: &Context, n: i32| async move { n }))
            .with_route(DEFAULT_ROUTE, Transform::new("fallback", |_: &Context, _: i32| async move { -1 }));
        assert_eq!(switch.process(&Context::background(), 3).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn no_route_and_no_default_errors() {
        let switch = Switch::new("s", parity_key())
            .with_route("even", Transform::new("even", |_: &Context, n: i32| async move { n }));
        let err = switch.process(&Context::background(), 3).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::NoRoute(name) if name == "odd"));
        assert_eq!(err.path(), &[Name::new("s")]);
    }

    #[tokio::test]
    async fn child_error_is_prefixed_with_switch_name() {
        #[derive(Debug, thiserror::Error)]
        #[error("fail")]
        struct Fail;

        let switch = Switch::new("s", parity_key()).with_route(
            "even",
            crate::processor::Apply::new("boom", |_: &Context, _: i32| async move { Err::<i32, _>(Fail) }),
        );
        let err = switch.process(&Context::background(), 2).await.unwrap_err();
        assert_eq!(err.path(), &[Name::new("s"), Name::new("boom")]);
    }
}
