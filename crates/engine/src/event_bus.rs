// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus: typed publish/subscribe fan-out over [`Event`][quaero_core::Event].
//!
//! Grounded in the teacher's WAL-backed `EventBus`/`EventReader` pair, but
//! generalized here to per-kind fan-out instead of a single global consumer:
//! each event kind gets its own ordered delivery queue, so a slow handler for
//! `job:progress` never blocks delivery of `document:saved`. Durability
//! (replaying missed events after a crash) is out of scope for the bus
//! itself — callers that need that persist the event's *effect* (job state,
//! documents) through `quaero-storage`, which is already WAL-backed.

use parking_lot::Mutex;
use quaero_core::{Event, EventHandler, EventHandlerError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

type HandlerList = Arc<parking_lot::RwLock<Vec<Arc<dyn EventHandler>>>>;

struct KindRoute {
    handlers: HandlerList,
    tx: mpsc::UnboundedSender<Event>,
}

#[derive(Default)]
struct Inner {
    kinds: HashMap<&'static str, KindRoute>,
}

/// Typed pub/sub over [`Event`]. Cheap to clone; all clones share the same
/// subscriber registry and delivery queues.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Register `handler` for every event whose [`Event::name`] equals
    /// `kind`. Handlers for the same kind are invoked in subscribe order,
    /// and in event-publish order relative to each other.
    pub fn subscribe(&self, kind: &'static str, handler: Arc<dyn EventHandler>) {
        let mut inner = self.inner.lock();
        let route = inner.kinds.entry(kind).or_insert_with(|| {
            let handlers: HandlerList = Arc::new(parking_lot::RwLock::new(Vec::new()));
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_kind_worker(kind, handlers.clone(), rx));
            KindRoute { handlers, tx }
        });
        route.handlers.write().push(handler);
    }

    fn handlers_for(&self, kind: &str) -> Vec<Arc<dyn EventHandler>> {
        self.inner
            .lock()
            .kinds
            .get(kind)
            .map(|route| route.handlers.read().clone())
            .unwrap_or_default()
    }

    /// Hand `event` to its kind's background worker and return immediately.
    /// Handler errors are logged, never surfaced to the publisher.
    pub fn publish(&self, event: Event) {
        let sender = self
            .inner
            .lock()
            .kinds
            .get(event.name())
            .map(|route| route.tx.clone());
        let Some(sender) = sender else {
            tracing::trace!(kind = event.name(), "publish with no subscribers");
            return;
        };
        // An unbounded send only fails if the receiving worker task has
        // already been dropped, which never happens while `self` is alive.
        let _ = sender.send(event);
    }

    /// Run every subscribed handler for `event`'s kind in registration
    /// order and wait for them all, returning the first error encountered.
    /// Used where a caller must observe the side effect (e.g. an
    /// incremented document count) before proceeding.
    pub async fn publish_sync(&self, event: Event) -> Result<(), EventHandlerError> {
        let handlers = self.handlers_for(event.name());
        let mut first_error = None;
        for handler in handlers {
            if let Err(err) = handler.handle(&event).await {
                tracing::warn!(kind = event.name(), error = %err, "event handler failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn run_kind_worker(
    kind: &'static str,
    handlers: HandlerList,
    mut rx: mpsc::UnboundedReceiver<Event>,
) {
    while let Some(event) = rx.recv().await {
        let snapshot = handlers.read().clone();
        for handler in snapshot {
            if let Err(err) = handler.handle(&event).await {
                tracing::warn!(kind, error = %err, "event handler failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
