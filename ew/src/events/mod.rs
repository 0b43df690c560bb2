//! Named-event bus and the connection stream it carries
//!
//! Every producer emits payloads under an event name; every consumer registers
//! a listener on the names it cares about and keeps the returned handle.
//!
//! # Architecture
//!
//! ```text
//!   producer ──emit("messages.upsert", payload)──┐
//!   producer ──emit("connection.update", ...)────┤
//!                                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       EVENT BUS                              │
//! │      event name ─► [ (id, listener), (id, listener), ... ]   │
//! │          listeners called in registration order              │
//! └─────────────────────────────────────────────────────────────┘
//!            ▲ on(name, f) -> ListenerHandle       ▲ off(&handle)
//!            └──────────── waits, loggers, ... ────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventwait::events::{CONNECTION_UPDATE, EventBus};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let handle = bus.on("messages.upsert", |payload| println!("{payload}"));
//! bus.emit("messages.upsert", &json!({ "id": "X" }));
//! bus.off(&handle);
//! ```

mod bus;
mod subscription;
mod types;

pub use bus::{EventBus, Listener, ListenerHandle, create_event_bus};
pub use subscription::Subscription;
pub use types::{CONNECTION_UPDATE, ConnectionState, ConnectionUpdate};
