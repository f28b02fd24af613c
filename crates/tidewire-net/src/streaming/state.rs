//! Lifecycle states of a channel connector.

/// Current state of a [`ChannelConnector`](super::ChannelConnector).
///
/// A connect run walks `Idle → Loading → Authenticating → Handshaking →
/// Subscribing → Subscribed`; any failure returns to `Idle`. Teardown goes
/// through `Disconnecting` back to `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No subscription and no connect run in flight.
    #[default]
    Idle,
    /// Ensuring the messaging runtime is loaded.
    Loading,
    /// Fetching the session credential.
    Authenticating,
    /// Waiting for the handshake reply.
    Handshaking,
    /// Waiting for the subscribe call to return.
    Subscribing,
    /// Subscribed; messages are being relayed.
    Subscribed,
    /// Unsubscribe/disconnect requests are in flight.
    Disconnecting,
}

impl ConnectionState {
    /// Whether a connect run is between its first step and the subscription.
    pub fn is_connecting(self) -> bool {
        matches!(
            self,
            Self::Loading | Self::Authenticating | Self::Handshaking | Self::Subscribing
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Subscribing => write!(f, "Subscribing"),
            Self::Subscribed => write!(f, "Subscribed"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}
