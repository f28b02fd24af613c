//! Error types for the networking module.

use std::fmt;

/// Network-specific errors.
///
/// The first group of variants mirrors the failure taxonomy of a streaming
/// connection (runtime load, credential, handshake, subscribe, teardown); the
/// rest cover the remote calls underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The messaging runtime could not be loaded.
    RuntimeLoad(String),
    /// The session-credential call failed.
    Credential(String),
    /// The handshake call failed before producing a reply.
    Handshake(String),
    /// Subscribing to the channel failed.
    Subscribe(String),
    /// Unsubscribing from the channel failed.
    Unsubscribe(String),
    /// Disconnecting the transport client failed.
    Disconnect(String),
    /// A connect was requested while a connection is live or being set up.
    AlreadyActive(String),
    /// Invalid connector or transport configuration.
    Configuration(String),
    /// Transport-level failure not attributable to a single step.
    Transport(String),
    /// HTTP request failed.
    Request(String),
    /// Invalid URL provided.
    InvalidUrl(String),
    /// Request timed out.
    Timeout,
    /// Connection refused or failed.
    Connection(String),
}

impl NetworkError {
    /// The bare failure message, without the category prefix used by `Display`.
    ///
    /// This is what error events carry: `Credential("Unauthorized")` yields
    /// `"Unauthorized"`.
    pub fn detail(&self) -> String {
        match self {
            Self::RuntimeLoad(msg)
            | Self::Credential(msg)
            | Self::Handshake(msg)
            | Self::Subscribe(msg)
            | Self::Unsubscribe(msg)
            | Self::Disconnect(msg)
            | Self::AlreadyActive(msg)
            | Self::Configuration(msg)
            | Self::Transport(msg)
            | Self::Request(msg)
            | Self::InvalidUrl(msg)
            | Self::Connection(msg) => msg.clone(),
            Self::Timeout => self.to_string(),
        }
    }

    /// Re-tag any error as a failure of the credential step, keeping its message.
    pub(crate) fn into_credential(self) -> Self {
        match self {
            Self::Credential(_) => self,
            other => Self::Credential(other.detail()),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuntimeLoad(msg) => write!(f, "Messaging runtime failed to load: {msg}"),
            Self::Credential(msg) => write!(f, "Session credential request failed: {msg}"),
            Self::Handshake(msg) => write!(f, "Handshake failed: {msg}"),
            Self::Subscribe(msg) => write!(f, "Subscribe failed: {msg}"),
            Self::Unsubscribe(msg) => write!(f, "Unsubscribe failed: {msg}"),
            Self::Disconnect(msg) => write!(f, "Disconnect failed: {msg}"),
            Self::AlreadyActive(msg) => write!(f, "Connector already active: {msg}"),
            Self::Configuration(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
            Self::Request(msg) => write!(f, "HTTP request error: {msg}"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Connection(msg) => write!(f, "Connection error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
