//! The seam between the connector and the messaging runtime.
//!
//! The connector never talks Bayeux itself. It drives a [`StreamingTransport`]
//! (a CometD-style client: configure, handshake, subscribe, unsubscribe,
//! disconnect) created by an injected [`TransportFactory`], which keeps the
//! connector free of global runtime state and lets tests substitute fakes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::Result;

/// Options applied to a transport client before the handshake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportOptions {
    /// Streaming endpoint URL.
    pub url: Url,
    /// Headers sent with every transport request (the credential travels here).
    pub request_headers: BTreeMap<String, String>,
    /// Whether the message type is appended to the URL path.
    pub append_message_type_to_url: bool,
    /// Whether the websocket transport may be negotiated. `false` forces long-polling.
    pub websocket_enabled: bool,
}

impl TransportOptions {
    /// Long-polling options for `url`, no headers, message type not appended.
    pub fn long_polling(url: Url) -> Self {
        Self {
            url,
            request_headers: BTreeMap::new(),
            append_message_type_to_url: false,
            websocket_enabled: false,
        }
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// Header names only, for logging without leaking credentials.
    pub fn header_names(&self) -> Vec<&str> {
        self.request_headers.keys().map(String::as_str).collect()
    }
}

/// Reply to a handshake request.
///
/// A rejected handshake is a reply with `successful == false`; it is carried
/// verbatim in the connector's error event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeReply {
    /// Whether the server accepted the handshake.
    pub successful: bool,
    /// Meta channel the reply arrived on, normally `/meta/handshake`.
    #[serde(default = "handshake_channel")]
    pub channel: String,
    /// Client id assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Protocol version spoken by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Server-provided failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reconnect advice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<Value>,
    /// Extension data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

fn handshake_channel() -> String {
    "/meta/handshake".to_string()
}

impl HandshakeReply {
    /// An accepted handshake with the given client id.
    pub fn accepted(client_id: impl Into<String>) -> Self {
        Self {
            successful: true,
            channel: handshake_channel(),
            client_id: Some(client_id.into()),
            ..Default::default()
        }
    }

    /// A rejected handshake with the given reason.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            successful: false,
            channel: handshake_channel(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Reply to an unsubscribe or disconnect request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReply {
    /// Whether the request succeeded.
    pub successful: bool,
    /// Server-provided failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationReply {
    /// A successful reply.
    pub fn ok() -> Self {
        Self {
            successful: true,
            error: None,
        }
    }

    /// A failed reply with the given reason.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            successful: false,
            error: Some(error.into()),
        }
    }
}

/// Opaque token for an active channel subscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: String,
    channel: String,
}

impl SubscriptionHandle {
    /// Create a handle. Transports choose the id format.
    pub fn new(id: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel: channel.into(),
        }
    }

    /// The transport-assigned id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The subscribed channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.channel, self.id)
    }
}

/// Callback invoked by a transport once per inbound channel message.
pub type MessageListener = Arc<dyn Fn(Value) + Send + Sync>;

/// A CometD-style messaging client.
///
/// Implementations own the wire protocol. Every method maps to one request of
/// the handshake → subscribe → unsubscribe → disconnect lifecycle.
#[async_trait]
pub trait StreamingTransport: Send + Sync {
    /// Apply endpoint, headers and transport flags. Called once, before `handshake`.
    fn configure(&self, options: &TransportOptions) -> Result<()>;

    /// Perform the handshake.
    ///
    /// `Err` means the request could not be made; a server refusal is
    /// `Ok` with `successful == false`.
    async fn handshake(&self) -> Result<HandshakeReply>;

    /// Subscribe to `channel`, delivering each message to `listener`.
    async fn subscribe(&self, channel: &str, listener: MessageListener)
    -> Result<SubscriptionHandle>;

    /// Cancel a subscription.
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<OperationReply>;

    /// Close the session opened by the handshake.
    async fn disconnect(&self) -> Result<OperationReply>;
}

/// Creates transport clients for a connector.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Ensure the messaging runtime is available.
    ///
    /// The connector calls this until it succeeds once, then never again.
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    /// Create a fresh, unconfigured transport client.
    fn create(&self) -> Result<Arc<dyn StreamingTransport>>;
}
