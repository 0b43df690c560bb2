//! Scoped listener registration
//!
//! A [`Subscription`] owns one listener handle and removes it from the bus
//! exactly once: on the first `release()`, or on drop if nobody released it.

use serde_json::Value;
use tracing::debug;

use super::bus::{EventBus, ListenerHandle};

/// Listener registration removed from the bus when released or dropped
pub struct Subscription<'a> {
    bus: &'a EventBus,
    handle: Option<ListenerHandle>,
}

impl<'a> Subscription<'a> {
    /// Take ownership of an already registered handle
    pub fn new(bus: &'a EventBus, handle: ListenerHandle) -> Self {
        Self {
            bus,
            handle: Some(handle),
        }
    }

    /// Handle of the listener, `None` once released
    pub fn handle(&self) -> Option<&ListenerHandle> {
        self.handle.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Remove the listener from the bus
    ///
    /// Only the first call does anything; it returns whether the bus still
    /// had the listener. Later calls return false.
    pub fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => self.bus.off(&handle),
            None => false,
        }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            debug!(event = handle.event(), id = handle.id(), "Subscription::drop: releasing listener");
            self.release();
        }
    }
}

impl EventBus {
    /// Register `listener` for `event`, removed when the returned guard goes
    pub fn subscribe<F>(&self, event: &str, listener: F) -> Subscription<'_>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let handle = self.on(event, listener);
        Subscription::new(self, handle)
    }
}
