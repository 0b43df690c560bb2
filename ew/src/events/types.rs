//! Payload types for the well-known connection stream
//!
//! The bus itself carries untyped `serde_json::Value` payloads. The one stream
//! every wait cares about is `connection.update`, so its shape is given a
//! typed view here:
//! - `connection`: `"open"`, `"connecting"` or `"close"`
//! - `lastDisconnect.error`: the upstream cause, present on some closes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::wait::DisconnectCause;

/// Name of the event carrying connection state changes
pub const CONNECTION_UPDATE: &str = "connection.update";

/// Connection state as broadcast on `connection.update`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Open,
    Connecting,
    Close,
}

impl ConnectionState {
    /// Wire value of this state
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Open => "open",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Close => "close",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ConnectionState::Open),
            "connecting" => Ok(ConnectionState::Connecting),
            "close" => Ok(ConnectionState::Close),
            other => Err(format!("unknown connection state: {}", other)),
        }
    }
}

/// Typed view of a `connection.update` payload
///
/// Parsing is lenient: an unknown `connection` value or a missing field reads
/// as `None` rather than failing, since updates routinely carry only a subset
/// of fields (QR codes, online flags, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionUpdate {
    pub connection: Option<ConnectionState>,
    pub last_disconnect: Option<DisconnectCause>,
}

impl ConnectionUpdate {
    /// Update announcing a state change with no disconnect cause
    pub fn state(connection: ConnectionState) -> Self {
        Self {
            connection: Some(connection),
            last_disconnect: None,
        }
    }

    /// Update announcing a close, optionally with its cause
    pub fn closed(cause: Option<DisconnectCause>) -> Self {
        Self {
            connection: Some(ConnectionState::Close),
            last_disconnect: cause,
        }
    }

    /// Read an update from a raw payload
    pub fn from_payload(payload: &Value) -> Self {
        let connection = payload
            .get("connection")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        let last_disconnect = payload
            .pointer("/lastDisconnect/error")
            .and_then(DisconnectCause::from_value);
        Self {
            connection,
            last_disconnect,
        }
    }

    /// Render the update as a bus payload
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({});
        if let Some(connection) = self.connection {
            payload["connection"] = json!(connection.as_str());
        }
        if let Some(cause) = &self.last_disconnect {
            payload["lastDisconnect"] = json!({ "error": cause.to_value() });
        }
        payload
    }

    /// Whether this update reports the connection as closed
    pub fn is_closed(&self) -> bool {
        self.connection == Some(ConnectionState::Close)
    }

    /// Cause to fail a pending wait with, if this update is a close
    ///
    /// Falls back to the default `Connection Closed` cause when the update
    /// carries no `lastDisconnect.error`.
    pub fn close_cause(&self) -> Option<DisconnectCause> {
        if !self.is_closed() {
            return None;
        }
        Some(
            self.last_disconnect
                .clone()
                .unwrap_or_else(DisconnectCause::connection_closed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::DisconnectReason;

    #[test]
    fn test_connection_state_roundtrip_str() {
        for state in [ConnectionState::Open, ConnectionState::Connecting, ConnectionState::Close] {
            assert_eq!(state.as_str().parse::<ConnectionState>().unwrap(), state);
        }
        assert!("closing".parse::<ConnectionState>().is_err());
    }

    #[test]
    fn test_connection_state_serde_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Close).unwrap();
        assert_eq!(json, "\"close\"");
    }

    #[test]
    fn test_from_payload_open() {
        let update = ConnectionUpdate::from_payload(&json!({ "connection": "open" }));
        assert_eq!(update.connection, Some(ConnectionState::Open));
        assert!(!update.is_closed());
        assert!(update.close_cause().is_none());
    }

    #[test]
    fn test_from_payload_without_connection_field() {
        let update = ConnectionUpdate::from_payload(&json!({ "qr": "2@abc" }));
        assert_eq!(update, ConnectionUpdate::default());
    }

    #[test]
    fn test_from_payload_unknown_state_is_none() {
        let update = ConnectionUpdate::from_payload(&json!({ "connection": "sleeping" }));
        assert!(update.connection.is_none());
    }

    #[test]
    fn test_close_without_cause_uses_default() {
        let update = ConnectionUpdate::from_payload(&json!({ "connection": "close" }));
        let cause = update.close_cause().unwrap();
        assert_eq!(cause.message, "Connection Closed");
        assert_eq!(cause.reason(), Some(DisconnectReason::ConnectionClosed));
    }

    #[test]
    fn test_close_with_cause() {
        let payload = json!({
            "connection": "close",
            "lastDisconnect": { "error": { "message": "Stream Errored", "output": { "statusCode": 515 } } }
        });
        let cause = ConnectionUpdate::from_payload(&payload).close_cause().unwrap();
        assert_eq!(cause.message, "Stream Errored");
        assert_eq!(cause.status_code, Some(515));
    }

    #[test]
    fn test_to_payload_reads_back() {
        let update = ConnectionUpdate::closed(Some(DisconnectCause::new("logged out", Some(401))));
        let back = ConnectionUpdate::from_payload(&update.to_payload());
        assert_eq!(back, update);
    }
}
