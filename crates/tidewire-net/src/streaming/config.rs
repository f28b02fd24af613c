//! Connector configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NetworkError, Result};

/// API version used for the streaming endpoint when none is configured.
pub const DEFAULT_API_VERSION: &str = "45.0";

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Configuration for a [`ChannelConnector`](super::ChannelConnector).
///
/// `channel` and `origin` are required; `api_version` defaults to `"45.0"` and
/// `debug` to `false`.
///
/// # Example
///
/// ```
/// use tidewire_net::streaming::ConnectorConfig;
/// use url::Url;
///
/// let config = ConnectorConfig::new(
///     Url::parse("https://example.my.site.com").unwrap(),
///     "/topic/InvoiceUpdates",
/// )
/// .api_version("58.0")
/// .debug(true);
///
/// assert_eq!(
///     config.endpoint_url().unwrap().as_str(),
///     "https://example.my.site.com/cometd/58.0/"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorConfig {
    /// Origin of the platform hosting the streaming endpoint.
    pub origin: Url,
    /// Name of the channel to subscribe to, e.g. `/topic/InvoiceUpdates`.
    pub channel: String,
    /// API version segment of the endpoint path.
    #[serde(default = "default_api_version", alias = "api_version")]
    pub api_version: String,
    /// Log every connector step at `debug` level.
    #[serde(default)]
    pub debug: bool,
}

impl ConnectorConfig {
    /// Create a configuration with the default API version and logging off.
    pub fn new(origin: Url, channel: impl Into<String>) -> Self {
        Self {
            origin,
            channel: channel.into(),
            api_version: default_api_version(),
            debug: false,
        }
    }

    /// Override the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Enable or disable diagnostic logging.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Check the configuration for values the connector cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.channel.trim().is_empty() {
            return Err(NetworkError::Configuration("channel must not be empty".into()));
        }
        if !self.channel.starts_with('/') {
            return Err(NetworkError::Configuration(format!(
                "channel '{}' must start with '/'",
                self.channel
            )));
        }
        if self.api_version.trim().is_empty() {
            return Err(NetworkError::Configuration(
                "api version must not be empty".into(),
            ));
        }
        if !matches!(self.origin.scheme(), "http" | "https") || self.origin.host_str().is_none() {
            return Err(NetworkError::Configuration(format!(
                "origin '{}' must be an http(s) URL with a host",
                self.origin
            )));
        }
        Ok(())
    }

    /// The streaming endpoint: `<origin>/cometd/<api_version>/`.
    ///
    /// Any path, query or fragment on the origin is discarded.
    pub fn endpoint_url(&self) -> Result<Url> {
        self.validate()?;
        let path = format!("/cometd/{}/", self.api_version.trim());
        Ok(self.origin.join(&path)?)
    }
}
