//! Session credentials for streaming connections.
//!
//! The streaming endpoint authenticates every request with a bearer token
//! obtained from a zero-argument remote call. [`CredentialSource`] abstracts
//! that call; [`HttpCredentialSource`] performs it over HTTP and
//! [`StaticCredential`] hands out a pre-issued token.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{NetworkError, Result};
use crate::http::{HttpClient, HttpMethod};
use tidewire_core::logging::targets;

/// An opaque session token.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Wrap a token. Surrounding whitespace is trimmed.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(NetworkError::Credential("session credential is empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw token.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value for the streaming endpoint.
    pub fn authorization_header(&self) -> String {
        format!("OAuth {}", self.0)
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionCredential").field(&"<redacted>").finish()
    }
}

/// Source of session credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch a credential for one connection attempt.
    async fn fetch(&self) -> Result<SessionCredential>;
}

/// A credential source that always returns the same token.
#[derive(Clone, Debug)]
pub struct StaticCredential(SessionCredential);

impl StaticCredential {
    /// Create a source for a pre-issued token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self(SessionCredential::new(token)?))
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn fetch(&self) -> Result<SessionCredential> {
        Ok(self.0.clone())
    }
}

/// Fetches the session credential from a remote endpoint.
///
/// The response body may be a JSON string (`"TOKEN"`), a JSON object holding
/// the token under [`token_field`](Self::token_field) (default `sessionId`),
/// or plain text. Failures are reported as [`NetworkError::Credential`] with
/// the server's message when one can be extracted.
///
/// # Example
///
/// ```ignore
/// use tidewire_net::streaming::{CredentialSource, HttpCredentialSource};
///
/// let source = HttpCredentialSource::new(
///     "https://example.my.site.com/services/apexrest/streaming/session".parse()?,
/// )?
/// .bearer_auth("access-token");
///
/// let credential = source.fetch().await?;
/// ```
#[derive(Clone, Debug)]
pub struct HttpCredentialSource {
    client: HttpClient,
    endpoint: Url,
    method: HttpMethod,
    token_field: String,
    bearer: Option<String>,
}

impl HttpCredentialSource {
    /// Create a source that `POST`s to `endpoint` with the default client timeouts.
    pub fn new(endpoint: Url) -> Result<Self> {
        Ok(Self::with_client(HttpClient::builder().build()?, endpoint))
    }

    /// Create a source that uses an existing HTTP client.
    pub fn with_client(client: HttpClient, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            method: HttpMethod::Post,
            token_field: "sessionId".to_string(),
            bearer: None,
        }
    }

    /// Use a different HTTP method for the call.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Read the token from a different field of a JSON object response.
    pub fn token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    /// Authenticate the credential call itself with a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// The endpoint this source calls.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call(&self) -> Result<String> {
        let mut call = self.client.call(self.method, &self.endpoint);
        if let Some(token) = &self.bearer {
            call = call.bearer_auth(token.as_str());
        }

        let reply = call.send().await?;
        if !reply.is_success() {
            let message = error_message(reply.body())
                .unwrap_or_else(|| format!("HTTP {}", reply.status()));
            return Err(NetworkError::Credential(message));
        }
        Ok(reply.into_body())
    }

    fn extract_token(&self, body: &str) -> Result<SessionCredential> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(token)) => SessionCredential::new(token),
            Ok(Value::Object(map)) => match map.get(&self.token_field) {
                Some(Value::String(token)) => SessionCredential::new(token.as_str()),
                _ => Err(NetworkError::Credential(format!(
                    "response has no '{}' field",
                    self.token_field
                ))),
            },
            Ok(_) => Err(NetworkError::Credential(
                "unexpected credential response shape".into(),
            )),
            // Not JSON: treat the body as the token itself.
            Err(_) => SessionCredential::new(body),
        }
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn fetch(&self) -> Result<SessionCredential> {
        tracing::debug!(target: targets::HTTP, endpoint = %self.endpoint, "fetching session credential");
        let body = self.call().await.map_err(NetworkError::into_credential)?;
        self.extract_token(&body)
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `[{"message": ..}]`, `{"message": ..}` and `{"error": ..}`;
/// otherwise returns the trimmed body if it is short enough to be a message.
fn error_message(body: &str) -> Option<String> {
    let text = |value: &Value| value.as_str().map(str::to_string);
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items.first().and_then(|item| text(&item["message"])),
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(text)
            .or_else(|| map.get("error").and_then(text)),
        Ok(Value::String(message)) => Some(message),
        _ => {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 512).then(|| trimmed.to_string())
        }
    }
}
