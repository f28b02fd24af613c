//! Payloads of the two connector events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transport::HandshakeReply;
use crate::error::NetworkError;

/// Detail of an `error` event.
///
/// Serializes untagged: text as a JSON string, a rejected handshake as the
/// reply object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// A human-readable failure description.
    Text(String),
    /// The reply of a rejected handshake.
    Status(HandshakeReply),
}

impl ErrorPayload {
    /// Text shown to a user: text verbatim, statuses as compact JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Status(reply) => {
                serde_json::to_string(reply).unwrap_or_else(|_| format!("{reply:?}"))
            }
        }
    }

    /// The handshake reply, if this payload carries one.
    pub fn status(&self) -> Option<&HandshakeReply> {
        match self {
            Self::Status(reply) => Some(reply),
            Self::Text(_) => None,
        }
    }
}

impl From<&NetworkError> for ErrorPayload {
    fn from(err: &NetworkError) -> Self {
        Self::Text(err.detail())
    }
}

impl From<HandshakeReply> for ErrorPayload {
    fn from(reply: HandshakeReply) -> Self {
        Self::Status(reply)
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Serializable form of the connector's events.
///
/// `Message` serializes as `{"payload": ..}`, `Error` as `{"error": ..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectorEvent {
    /// An inbound channel message, unchanged.
    Message {
        /// The raw message.
        payload: Value,
    },
    /// A failure surfaced by the connector.
    Error {
        /// What went wrong.
        error: ErrorPayload,
    },
}

impl ConnectorEvent {
    /// Whether this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
