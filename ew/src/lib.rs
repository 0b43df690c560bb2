//! eventwait - bounded waits for filtered events
//!
//! Lets a caller suspend until an occurrence of a named event satisfies a
//! predicate, while treating a `connection.update` close as an early failure
//! and enforcing an overall deadline.
//!
//! # Core Concepts
//!
//! - **Named-event bus**: listeners register per event name and keep a handle
//! - **One winner**: match, closure, deadline or predicate error; first one ends the wait
//! - **No leaked listeners**: both listeners of a wait are removed on every exit path
//! - **Ordered judging**: occurrences reach the predicate one at a time, in emission order
//!
//! # Modules
//!
//! - [`events`] - Event bus, listener handles, connection update types
//! - [`wait`] - Wait coordinator, predicates, error taxonomy
//! - [`script`] - Scripted event sequences for replaying onto a bus
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod events;
pub mod script;
pub mod wait;

// Re-export commonly used types
pub use config::Config;
pub use events::{
    CONNECTION_UPDATE, ConnectionState, ConnectionUpdate, EventBus, ListenerHandle, Subscription, create_event_bus,
};
pub use script::{Script, ScriptStep};
pub use wait::{
    DisconnectCause, DisconnectReason, EventWaiter, Predicate, PredicateError, WaitError, wait_for_connection,
    wait_for_event,
};

/// Default wait deadline (60s)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
