//! Wait coordinator - race a filtered event against closure and a deadline
//!
//! One wait registers exactly two listeners: one on `connection.update` and
//! one on the awaited event. Both listeners only enqueue; the wait itself
//! drives a biased select over three signals:
//!
//! ```text
//!   connection.update ──close──► closed slot ─┐
//!   deadline timer ───────────────────────────┼─► select! (biased, first wins)
//!   <event> ──► queue ──► predicate, one at a time ─┘
//! ```
//!
//! Whichever branch wins, both listeners are released before the result is
//! returned. If the wait future is dropped early, the subscription guards
//! release them on drop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::debug;
use uuid::Uuid;

use super::error::WaitError;
use super::predicate::{self, Predicate};
use crate::events::{CONNECTION_UPDATE, ConnectionState, ConnectionUpdate, EventBus};

/// Wait until `predicate` accepts an occurrence of `event`
///
/// Fails with [`WaitError::ConnectionClosed`] if a `connection.update` reports
/// a close first, with [`WaitError::Timeout`] once `timeout` elapses, and with
/// [`WaitError::PredicateFailure`] if the predicate errors. A zero timeout is an
/// immediate deadline.
///
/// Occurrences are judged in emission order, one at a time. When several
/// signals are ready together the close wins, then the deadline, then the
/// next queued occurrence; a close arriving while an evaluation is pending
/// preempts it.
pub async fn wait_for_event<P>(bus: &EventBus, event: &str, predicate: P, timeout: Duration) -> Result<(), WaitError>
where
    P: Predicate,
{
    let wait_id = Uuid::now_v7();
    let deadline = Instant::now() + timeout;
    debug!(%wait_id, event, ?timeout, "wait_for_event: called");

    let (closed_tx, mut closed_rx) = oneshot::channel();
    let closed_tx = Mutex::new(Some(closed_tx));
    let mut close_sub = bus.subscribe(CONNECTION_UPDATE, move |payload| {
        let Some(cause) = ConnectionUpdate::from_payload(payload).close_cause() else {
            return;
        };
        let sender = closed_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(sender) = sender {
            debug!(%wait_id, %cause, "wait_for_event: connection closed");
            let _ = sender.send(cause);
        }
    });

    let (occurrence_tx, mut occurrence_rx) = mpsc::unbounded_channel();
    let mut event_sub = bus.subscribe(event, move |payload| {
        let _ = occurrence_tx.send(payload.clone());
    });
    debug!(%wait_id, event, "wait_for_event: listeners registered");

    let outcome = tokio::select! {
        biased;
        Ok(cause) = &mut closed_rx => Err(WaitError::ConnectionClosed(cause)),
        _ = sleep_until(deadline) => Err(WaitError::Timeout {
            event: event.to_string(),
            timeout,
        }),
        result = judge_occurrences(&predicate, &mut occurrence_rx, event, wait_id) => result,
    };

    event_sub.release();
    close_sub.release();

    match &outcome {
        Ok(()) => debug!(%wait_id, event, "wait_for_event: matched"),
        Err(e) => debug!(%wait_id, event, error = %e, "wait_for_event: failed"),
    }
    outcome
}

/// Feed queued occurrences to the predicate until one matches or it errors
async fn judge_occurrences<P>(
    predicate: &P,
    occurrences: &mut mpsc::UnboundedReceiver<Value>,
    event: &str,
    wait_id: Uuid,
) -> Result<(), WaitError>
where
    P: Predicate + ?Sized,
{
    let mut judged = 0u64;
    while let Some(payload) = occurrences.recv().await {
        judged += 1;
        match predicate.check(&payload).await {
            Ok(true) => {
                debug!(%wait_id, judged, "judge_occurrences: predicate accepted");
                return Ok(());
            }
            Ok(false) => {
                debug!(%wait_id, judged, "judge_occurrences: predicate rejected");
            }
            Err(source) => {
                debug!(%wait_id, judged, error = %source, "judge_occurrences: predicate failed");
                return Err(WaitError::PredicateFailure {
                    event: event.to_string(),
                    source,
                });
            }
        }
    }
    // The sender lives inside the event listener until release, so the queue never drains dry here
    std::future::pending().await
}

/// Wait on `connection.update` until the connection reaches `state`
///
/// Waiting for `Close` always ends in [`WaitError::ConnectionClosed`], since
/// closure is checked before the predicate.
pub async fn wait_for_connection(bus: &EventBus, state: ConnectionState, timeout: Duration) -> Result<(), WaitError> {
    debug!(%state, ?timeout, "wait_for_connection: called");
    let reached = predicate::from_fn(move |payload| ConnectionUpdate::from_payload(payload).connection == Some(state));
    wait_for_event(bus, CONNECTION_UPDATE, reached, timeout).await
}

/// Waiter bound to one event on one bus
///
/// Cheap to clone; every `wait` is independent and owns its own listeners.
#[derive(Clone)]
pub struct EventWaiter {
    bus: Arc<EventBus>,
    event: String,
}

impl EventWaiter {
    pub fn new(bus: Arc<EventBus>, event: impl Into<String>) -> Self {
        Self {
            bus,
            event: event.into(),
        }
    }

    /// Event this waiter listens for
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Wait until `predicate` accepts an occurrence of the bound event
    pub async fn wait<P>(&self, predicate: P, timeout: Duration) -> Result<(), WaitError>
    where
        P: Predicate,
    {
        wait_for_event(&self.bus, &self.event, predicate, timeout).await
    }
}
