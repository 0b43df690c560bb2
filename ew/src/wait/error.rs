//! Wait errors and the disconnect taxonomy
//!
//! Callers need to tell a deadline apart from an upstream disconnect apart
//! from a broken predicate, so every failure carries a kind and, where one
//! exists, a status code.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

/// Error returned by a predicate evaluation
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Status codes attached to disconnect causes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    ConnectionClosed,
    ConnectionLost,
    ConnectionReplaced,
    TimedOut,
    LoggedOut,
    BadSession,
    RestartRequired,
    MultideviceMismatch,
    Forbidden,
    UnavailableService,
}

impl DisconnectReason {
    /// Numeric status code of this reason
    pub fn status_code(&self) -> u16 {
        match self {
            DisconnectReason::ConnectionClosed => 428,
            DisconnectReason::ConnectionLost => 408,
            DisconnectReason::ConnectionReplaced => 440,
            DisconnectReason::TimedOut => 408,
            DisconnectReason::LoggedOut => 401,
            DisconnectReason::BadSession => 500,
            DisconnectReason::RestartRequired => 515,
            DisconnectReason::MultideviceMismatch => 411,
            DisconnectReason::Forbidden => 403,
            DisconnectReason::UnavailableService => 503,
        }
    }

    /// Reason for a status code
    ///
    /// 408 is shared by `ConnectionLost` and `TimedOut` and reads back as
    /// `ConnectionLost`.
    pub fn from_status_code(code: u16) -> Option<Self> {
        match code {
            428 => Some(DisconnectReason::ConnectionClosed),
            408 => Some(DisconnectReason::ConnectionLost),
            440 => Some(DisconnectReason::ConnectionReplaced),
            401 => Some(DisconnectReason::LoggedOut),
            500 => Some(DisconnectReason::BadSession),
            515 => Some(DisconnectReason::RestartRequired),
            411 => Some(DisconnectReason::MultideviceMismatch),
            403 => Some(DisconnectReason::Forbidden),
            503 => Some(DisconnectReason::UnavailableService),
            _ => None,
        }
    }
}

/// Upstream cause of a connection close
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DisconnectCause {
    pub message: String,
    pub status_code: Option<u16>,
    pub data: Option<Value>,
}

impl DisconnectCause {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status_code,
            data: None,
        }
    }

    /// Default cause used when a close carries none
    pub fn connection_closed() -> Self {
        Self::new(
            "Connection Closed",
            Some(DisconnectReason::ConnectionClosed.status_code()),
        )
    }

    /// Known reason for this cause's status code, if any
    pub fn reason(&self) -> Option<DisconnectReason> {
        self.status_code.and_then(DisconnectReason::from_status_code)
    }

    /// Read a cause from a `lastDisconnect.error` value
    ///
    /// Accepts a bare string (message only) or an object with `message`, a
    /// status code at `output.statusCode` or `statusCode`, and optional `data`.
    /// Null and other shapes yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(message) => Some(Self::new(message.clone(), None)),
            Value::Object(fields) => {
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Connection Closed")
                    .to_string();
                let status_code = value
                    .pointer("/output/statusCode")
                    .or_else(|| fields.get("statusCode"))
                    .and_then(Value::as_u64)
                    .and_then(|code| u16::try_from(code).ok());
                let data = fields.get("data").filter(|d| !d.is_null()).cloned();
                Some(Self {
                    message,
                    status_code,
                    data,
                })
            }
            _ => None,
        }
    }

    /// Render the cause in the shape `from_value` reads
    pub fn to_value(&self) -> Value {
        let mut value = json!({ "message": self.message });
        if let Some(code) = self.status_code {
            value["output"] = json!({ "statusCode": code });
        }
        if let Some(data) = &self.data {
            value["data"] = data.clone();
        }
        value
    }
}

/// Terminal failure of a wait
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Connection closed: {0}")]
    ConnectionClosed(DisconnectCause),

    #[error("Timed Out waiting for {event} after {timeout:?}")]
    Timeout { event: String, timeout: Duration },

    #[error("Predicate failed on {event}: {source}")]
    PredicateFailure {
        event: String,
        #[source]
        source: PredicateError,
    },
}

impl WaitError {
    /// Status code for callers that discriminate on codes
    ///
    /// Closures report their cause's code, deadlines report `TimedOut` (408),
    /// predicate failures have none.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            WaitError::ConnectionClosed(cause) => cause.status_code,
            WaitError::Timeout { .. } => Some(DisconnectReason::TimedOut.status_code()),
            WaitError::PredicateFailure { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_connection_closed(&self) -> bool {
        matches!(self, WaitError::ConnectionClosed(_))
    }

    pub fn is_predicate_failure(&self) -> bool {
        matches!(self, WaitError::PredicateFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cause() {
        let cause = DisconnectCause::connection_closed();
        assert_eq!(cause.to_string(), "Connection Closed");
        assert_eq!(cause.status_code, Some(428));
        assert_eq!(cause.reason(), Some(DisconnectReason::ConnectionClosed));
    }

    #[test]
    fn test_status_codes_read_back() {
        for reason in [
            DisconnectReason::ConnectionClosed,
            DisconnectReason::ConnectionReplaced,
            DisconnectReason::LoggedOut,
            DisconnectReason::BadSession,
            DisconnectReason::RestartRequired,
            DisconnectReason::MultideviceMismatch,
            DisconnectReason::Forbidden,
            DisconnectReason::UnavailableService,
        ] {
            assert_eq!(DisconnectReason::from_status_code(reason.status_code()), Some(reason));
        }
        assert_eq!(
            DisconnectReason::from_status_code(408),
            Some(DisconnectReason::ConnectionLost)
        );
        assert_eq!(DisconnectReason::from_status_code(200), None);
    }

    #[test]
    fn test_from_value_string() {
        let cause = DisconnectCause::from_value(&json!("socket hang up")).unwrap();
        assert_eq!(cause.message, "socket hang up");
        assert_eq!(cause.status_code, None);
    }

    #[test]
    fn test_from_value_output_status_code() {
        let cause = DisconnectCause::from_value(&json!({
            "message": "Connection Failure",
            "output": { "statusCode": 401 },
            "data": { "reason": "401" }
        }))
        .unwrap();
        assert_eq!(cause.reason(), Some(DisconnectReason::LoggedOut));
        assert_eq!(cause.data, Some(json!({ "reason": "401" })));
    }

    #[test]
    fn test_from_value_flat_status_code() {
        let cause = DisconnectCause::from_value(&json!({ "message": "replaced", "statusCode": 440 })).unwrap();
        assert_eq!(cause.reason(), Some(DisconnectReason::ConnectionReplaced));
    }

    #[test]
    fn test_from_value_null_is_none() {
        assert!(DisconnectCause::from_value(&Value::Null).is_none());
        assert!(DisconnectCause::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_wait_error_discrimination() {
        let closed = WaitError::ConnectionClosed(DisconnectCause::connection_closed());
        assert!(closed.is_connection_closed());
        assert_eq!(closed.status_code(), Some(428));

        let timeout = WaitError::Timeout {
            event: "messages.upsert".to_string(),
            timeout: Duration::from_millis(5000),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.status_code(), Some(408));
        assert!(timeout.to_string().starts_with("Timed Out"));

        let failed = WaitError::PredicateFailure {
            event: "messages.upsert".to_string(),
            source: "bad payload".into(),
        };
        assert!(failed.is_predicate_failure());
        assert_eq!(failed.status_code(), None);
        assert!(std::error::Error::source(&failed).is_some());
    }
}
