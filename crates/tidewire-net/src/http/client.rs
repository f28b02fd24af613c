//! The shared HTTP client.

use std::time::Duration;

use url::Url;

use super::call::{HttpMethod, RemoteCall};
use crate::error::Result;

const USER_AGENT: &str = concat!("Tidewire/", env!("CARGO_PKG_VERSION"), " (Rust)");

/// Builder for an [`HttpClient`].
///
/// Defaults to a 30 second request timeout and a 10 second connect timeout.
#[derive(Clone, Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl HttpClientBuilder {
    /// Set the timeout for a whole call, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(HttpClient {
            client,
            timeout: self.timeout,
        })
    }
}

/// Client for remote calls.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a builder for configuring a new client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// The timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Prepare a call to `url`.
    pub fn call(&self, method: HttpMethod, url: &Url) -> RemoteCall {
        RemoteCall::new(self.client.clone(), method, url.clone())
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
