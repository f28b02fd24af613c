//! One remote call and its reply.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NetworkError, Result};
use tidewire_core::logging::targets;

/// HTTP method of a remote call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    #[default]
    Post,
}

impl HttpMethod {
    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A call being prepared. Created by [`HttpClient::call`](super::HttpClient::call).
///
/// The call carries no body or query and always asks for `application/json`.
#[must_use = "a remote call does nothing until sent"]
pub struct RemoteCall {
    client: reqwest::Client,
    method: HttpMethod,
    url: Url,
    bearer: Option<String>,
}

impl RemoteCall {
    pub(crate) fn new(client: reqwest::Client, method: HttpMethod, url: Url) -> Self {
        Self {
            client,
            method,
            url,
            bearer: None,
        }
    }

    /// Authenticate the call with a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Send the call and buffer the whole reply.
    ///
    /// Any status is a reply; only transport failures are errors.
    pub async fn send(self) -> Result<RemoteReply> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                self.url.scheme()
            )));
        }
        tracing::debug!(target: targets::HTTP, method = %self.method, url = %self.url, "calling remote endpoint");

        let mut request = self
            .client
            .request(self.method.to_reqwest(), self.url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(target: targets::HTTP, status, bytes = body.len(), "reply received");
        Ok(RemoteReply { status, body })
    }
}

impl std::fmt::Debug for RemoteCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCall")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("authenticated", &self.bearer.is_some())
            .finish()
    }
}

/// The status and body of a completed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteReply {
    status: u16,
    body: String,
}

impl RemoteReply {
    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Take the response body.
    pub fn into_body(self) -> String {
        self.body
    }
}
