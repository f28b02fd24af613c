//! Streaming channel connector.
//!
//! [`ChannelConnector`] manages a single subscription to a named channel on a
//! CometD-style streaming endpoint and reports what happens through two
//! events: `message` for every inbound payload and `error` for failures.
//!
//! The wire protocol lives behind [`StreamingTransport`]; credentials come
//! from a [`CredentialSource`]. Both are injected, so the connector holds no
//! global state.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tidewire_net::streaming::{
//!     ChannelConnector, ConnectorConfig, ConnectorEvent, HttpCredentialSource,
//! };
//!
//! let config = ConnectorConfig::new("https://acme.my.site.com".parse()?, "/topic/InvoiceUpdates");
//! let credentials = HttpCredentialSource::new(
//!     "https://acme.my.site.com/services/apexrest/streaming/session".parse()?,
//! )?;
//! let connector = ChannelConnector::new(config, Arc::new(credentials), transport_factory);
//!
//! let mut events = connector.events();
//! connector.connect();
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ConnectorEvent::Message { payload } => println!("{payload}"),
//!         ConnectorEvent::Error { error } => eprintln!("{error}"),
//!     }
//! }
//! ```

mod config;
mod connector;
mod credential;
mod event;
mod state;
mod transport;

pub use config::{ConnectorConfig, DEFAULT_API_VERSION};
pub use connector::{ChannelConnector, ConnectorEvents};
pub use credential::{CredentialSource, HttpCredentialSource, SessionCredential, StaticCredential};
pub use event::{ConnectorEvent, ErrorPayload};
pub use state::ConnectionState;
pub use transport::{
    HandshakeReply, MessageListener, OperationReply, StreamingTransport, SubscriptionHandle,
    TransportFactory, TransportOptions,
};
