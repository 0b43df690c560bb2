//! Bounded waits for filtered events
//!
//! A wait suspends the caller until an occurrence of a named event satisfies
//! a predicate, the connection closes, or a deadline passes, whichever comes
//! first. Each wait owns the two listeners it registers and removes both
//! before its result is returned.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use eventwait::events::create_event_bus;
//! use eventwait::wait::predicate;
//!
//! let bus = create_event_bus();
//! let waiter = bus.waiter_for("messages.upsert");
//! waiter
//!     .wait(predicate::field_equals("/key/id", "X"), Duration::from_secs(5))
//!     .await?;
//! ```

mod coordinator;
mod error;
pub mod predicate;

pub use coordinator::{EventWaiter, wait_for_connection, wait_for_event};
pub use error::{DisconnectCause, DisconnectReason, PredicateError, WaitError};
pub use predicate::Predicate;
