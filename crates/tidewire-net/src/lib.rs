//! Networking module for Tidewire.
//!
//! This crate provides the network side of Tidewire:
//!
//! - **Remote Calls**: The HTTP call that fetches a session credential
//! - **Session Credentials**: Fetching the token a streaming connection uses
//! - **Channel Connector**: One streaming subscription, reported through signals
//!
//! # Channel Connector
//!
//! ```ignore
//! use std::sync::Arc;
//! use tidewire_net::streaming::{ChannelConnector, ConnectorConfig, StaticCredential};
//!
//! let connector = ChannelConnector::new(
//!     ConnectorConfig::new(origin, "/topic/InvoiceUpdates").debug(true),
//!     Arc::new(StaticCredential::new(token)?),
//!     transport_factory,
//! );
//!
//! connector.message().connect(|payload| println!("message: {payload}"));
//! connector.error().connect(|error| eprintln!("error: {error}"));
//!
//! // Returns immediately; progress is reported through the signals.
//! connector.connect();
//! ```
//!
//! # Remote Calls
//!
//! ```ignore
//! use std::time::Duration;
//! use tidewire_net::http::{HttpClient, HttpMethod};
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let reply = client
//!     .call(HttpMethod::Post, &endpoint)
//!     .bearer_auth("access-token")
//!     .send()
//!     .await?;
//! ```

mod error;
pub mod http;
pub mod streaming;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use http::{HttpClient, HttpMethod};
pub use streaming::{
    ChannelConnector, ConnectionState, ConnectorConfig, ConnectorEvent, CredentialSource,
    ErrorPayload, HttpCredentialSource, SessionCredential, StaticCredential, StreamingTransport,
    TransportFactory,
};
