//! Prelude module for Tidewire.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use tidewire::prelude::*;
//! ```

// ============================================================================
// Signal/Slot and Property System
// ============================================================================

pub use tidewire_core::{ConnectionGuard, ConnectionId, Property, Signal};

// ============================================================================
// Channel Connector
// ============================================================================

pub use tidewire_net::streaming::{
    ChannelConnector, ConnectionState, ConnectorConfig, ConnectorEvent, CredentialSource,
    ErrorPayload, HandshakeReply, HttpCredentialSource, StaticCredential, StreamingTransport,
    TransportFactory,
};
pub use tidewire_net::NetworkError;

// ============================================================================
// Widgets and Settings
// ============================================================================

pub use crate::settings::{CredentialSettings, SettingsError, StreamingSettings};
pub use crate::widget::SubscriberWidget;
