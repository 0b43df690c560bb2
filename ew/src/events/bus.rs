//! Event Bus - named-event pub/sub with explicit listener handles
//!
//! Listeners register against an event name and get back a [`ListenerHandle`].
//! The handle is the only way to remove that listener again, so two listeners
//! on the same event never interfere with each other's removal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::debug;

use crate::wait::EventWaiter;

/// Callback invoked with each payload emitted on its event
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identity of one registered listener
///
/// Returned by [`EventBus::on`] and consumed by [`EventBus::off`]. Ids are
/// unique across the bus, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    event: String,
    id: u64,
}

impl ListenerHandle {
    /// Event name this listener is registered on
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Bus-unique listener id
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// In-process event bus keyed by event name
///
/// Listeners for one event are called in registration order. `emit` snapshots
/// the listener list and calls it outside the registry lock, so a listener may
/// itself call `on` or `off`.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        debug!("EventBus::new: creating event bus");
        Self::default()
    }

    /// Register `listener` for `event`
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerHandle
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.registry();
        let entry = listeners.entry(event.to_string()).or_default();
        entry.push((id, Arc::new(listener)));
        debug!(event, id, count = entry.len(), "EventBus::on: listener registered");
        ListenerHandle {
            event: event.to_string(),
            id,
        }
    }

    /// Remove the listener behind `handle`
    ///
    /// Returns false if it was already removed. Other listeners on the same
    /// event are left alone.
    pub fn off(&self, handle: &ListenerHandle) -> bool {
        let mut listeners = self.registry();
        let Some(entry) = listeners.get_mut(&handle.event) else {
            debug!(event = %handle.event, id = handle.id, "EventBus::off: no listeners for event");
            return false;
        };
        let before = entry.len();
        entry.retain(|(id, _)| *id != handle.id);
        let removed = entry.len() < before;
        if entry.is_empty() {
            listeners.remove(&handle.event);
        }
        debug!(event = %handle.event, id = handle.id, removed, "EventBus::off");
        removed
    }

    /// Deliver `payload` to every listener of `event`
    ///
    /// Returns the number of listeners called. With no listeners the payload
    /// is dropped.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<Listener> = self
            .registry()
            .get(event)
            .map(|entry| entry.iter().map(|(_, listener)| Arc::clone(listener)).collect())
            .unwrap_or_default();
        debug!(event, listeners = snapshot.len(), "EventBus::emit");
        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    /// Number of listeners currently registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry().get(event).map_or(0, Vec::len)
    }

    /// Names of all events with at least one listener
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a waiter bound to one event on this bus
    pub fn waiter_for(self: &Arc<Self>, event: impl Into<String>) -> EventWaiter {
        let event = event.into();
        debug!(%event, "EventBus::waiter_for: creating waiter");
        EventWaiter::new(Arc::clone(self), event)
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Vec<(u64, Listener)>>> {
        // Listeners run outside the lock, so a poisoned guard still holds a consistent table
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::new())
}
