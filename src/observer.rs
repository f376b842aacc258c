//! Per-connector-instance observer hooks: optional, fire-and-forget event callbacks.
//!
//! Connectors may emit diagnostic events (`filter-passed`, `filter-skipped`, `switch-routed`,
//! ...) to any registered observers. Dispatch happens via `tokio::spawn`, off the critical path,
//! so an observer can neither block nor influence what `process` returns — simplified from a
//! full event-taxonomy hook trait to plain closures, since nothing here needs to intervene in
//! the call it observes.

use std::sync::{Arc, RwLock};

use crate::name::Name;

/// A named event raised by a connector instance, carrying the connector's own [`Name`] and a
/// free-form `kind` tag (`"filter-passed"`, `"switch-routed"`, ...).
#[derive(Clone, Debug)]
pub struct Event {
    /// The connector that raised this event.
    pub connector: Name,
    /// What happened.
    pub kind: &'static str,
    /// The routed/matched key, if the event kind carries one (e.g. `switch-routed`).
    pub detail: Option<Name>,
}

/// An observer callback: `Fn(Event)`, invoked on its own spawned task.
pub type ObserverFn = Arc<dyn Fn(Event) + Send + Sync>;

/// A lock-guarded list of observer callbacks attached to one connector instance.
pub struct Observers {
    callbacks: RwLock<Vec<ObserverFn>>,
}

impl Observers {
    /// An empty observer list.
    pub fn new() -> Self {
        Self { callbacks: RwLock::new(Vec::new()) }
    }

    /// Registers `callback`, to be invoked (on its own task) for every subsequent [`notify`](Self::notify).
    pub fn subscribe(&self, callback: ObserverFn) {
        self.callbacks.write().expect("observer list lock poisoned").push(callback);
    }

    /// Fires `event` to every registered callback, each on its own spawned task.
    pub fn notify(&self, event: Event) {
        let callbacks = self.callbacks.read().expect("observer list lock poisoned");
        for callback in callbacks.iter() {
            let callback = Arc::clone(callback);
            let event = event.clone();
            tokio::spawn(async move { callback(event) });
        }
    }
}

impl Default for Observers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn notify_dispatches_to_every_subscriber_without_blocking() {
        let observers = Observers::new();
        let hits = Arc::new(AtomicU32::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            observers.subscribe(Arc::new(move |_event: Event| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        observers.notify(Event { connector: Name::new("c"), kind: "filter-passed", detail: None });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_observers_is_a_no_op() {
        let observers = Observers::new();
        observers.notify(Event { connector: Name::new("c"), kind: "filter-skipped", detail: None });
    }
}
