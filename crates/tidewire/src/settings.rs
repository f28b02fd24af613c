//! File-based configuration for a streaming subscription.
//!
//! Settings are read from TOML or JSON, chosen by file extension:
//!
//! ```toml
//! connect_on_create = true
//!
//! [connector]
//! origin = "https://acme.my.site.com"
//! channel = "/topic/InvoiceUpdates"
//! api_version = "58.0"
//! debug = true
//!
//! [credential]
//! endpoint = "https://acme.my.site.com/services/apexrest/streaming/session"
//! method = "POST"
//! token_field = "sessionId"
//! timeout_secs = 30
//! ```
//!
//! `TIDEWIRE_CHANNEL`, `TIDEWIRE_API_VERSION` and `TIDEWIRE_DEBUG` override
//! the file through [`StreamingSettings::apply_env_overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use tidewire_core::PerfSpan;
use tidewire_core::logging::targets;
use tidewire_net::http::{HttpClient, HttpMethod};
use tidewire_net::streaming::{ConnectorConfig, HttpCredentialSource};

/// Environment variable overriding the channel name.
pub const ENV_CHANNEL: &str = "TIDEWIRE_CHANNEL";
/// Environment variable overriding the API version.
pub const ENV_API_VERSION: &str = "TIDEWIRE_API_VERSION";
/// Environment variable toggling diagnostic logging.
pub const ENV_DEBUG: &str = "TIDEWIRE_DEBUG";

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("Unsupported settings format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// The settings parsed but cannot be used.
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

impl SettingsError {
    fn invalid(message: impl std::fmt::Display) -> Self {
        Self::Invalid(message.to_string())
    }
}

fn default_token_field() -> String {
    "sessionId".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_on_create() -> bool {
    true
}

/// How to obtain the session credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSettings {
    /// The remote call returning the token.
    pub endpoint: Url,
    /// HTTP method of the call.
    #[serde(default)]
    pub method: HttpMethod,
    /// Field holding the token when the response is a JSON object.
    #[serde(default = "default_token_field")]
    pub token_field: String,
    /// Bearer token authenticating the credential call itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CredentialSettings {
    /// Settings for `endpoint` with every other field at its default.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            method: HttpMethod::default(),
            token_field: default_token_field(),
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Everything needed to run one channel subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingSettings {
    /// Connector configuration.
    pub connector: ConnectorConfig,
    /// Credential call configuration.
    pub credential: CredentialSettings,
    /// Subscribe as soon as a widget is built from these settings.
    #[serde(default = "default_connect_on_create")]
    pub connect_on_create: bool,
}

impl StreamingSettings {
    /// Settings that connect on create, with `credential` fetched before
    /// every connection `connector` makes.
    pub fn new(connector: ConnectorConfig, credential: CredentialSettings) -> Self {
        Self {
            connector,
            credential,
            connect_on_create: default_connect_on_create(),
        }
    }

    /// Parse and validate TOML settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate JSON settings.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let _span = PerfSpan::new("settings_load");
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !matches!(extension.as_str(), "toml" | "json") {
            return Err(SettingsError::UnsupportedFormat(extension));
        }

        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(target: targets::SETTINGS, path = %path.display(), "loading settings");

        if extension == "toml" {
            Self::from_toml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    /// Check that the settings describe a usable subscription.
    pub fn validate(&self) -> Result<()> {
        self.connector.validate().map_err(SettingsError::invalid)?;
        if !matches!(self.credential.endpoint.scheme(), "http" | "https") {
            return Err(SettingsError::Invalid(format!(
                "credential endpoint '{}' must be an http(s) URL",
                self.credential.endpoint
            )));
        }
        if self.credential.token_field.trim().is_empty() {
            return Err(SettingsError::invalid("token_field must not be empty"));
        }
        if self.credential.timeout_secs == 0 {
            return Err(SettingsError::invalid("timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Apply `TIDEWIRE_*` overrides from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply `TIDEWIRE_*` overrides read through `lookup`.
    ///
    /// Empty values are ignored. `TIDEWIRE_DEBUG` accepts `1/true/yes/on`
    /// and `0/false/no/off`; anything else is ignored with a warning. The
    /// result is validated again, so an override cannot produce settings that
    /// a file could not.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(channel) = var(ENV_CHANNEL) {
            tracing::debug!(target: targets::SETTINGS, %channel, "channel overridden from environment");
            self.connector.channel = channel.trim().to_string();
        }
        if let Some(version) = var(ENV_API_VERSION) {
            tracing::debug!(target: targets::SETTINGS, %version, "api version overridden from environment");
            self.connector.api_version = version.trim().to_string();
        }
        if let Some(flag) = var(ENV_DEBUG) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.connector.debug = true,
                "0" | "false" | "no" | "off" => self.connector.debug = false,
                other => {
                    tracing::warn!(target: targets::SETTINGS, value = other, "ignoring unrecognised TIDEWIRE_DEBUG value");
                }
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Build the HTTP credential source these settings describe.
    pub fn credential_source(&self) -> Result<HttpCredentialSource> {
        let credential = &self.credential;
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(credential.timeout_secs))
            .build()
            .map_err(SettingsError::invalid)?;

        let mut source = HttpCredentialSource::with_client(client, credential.endpoint.clone())
            .method(credential.method)
            .token_field(credential.token_field.clone());
        if let Some(token) = &credential.bearer_token {
            source = source.bearer_auth(token.clone());
        }
        Ok(source)
    }
}
