//! Remote calls over HTTP.
//!
//! Tidewire makes exactly one kind of HTTP request: a zero-argument call to
//! an endpoint that answers with a small JSON body, such as the session
//! credential a streaming connection authenticates with. [`HttpClient`] owns
//! the connection pool and timeouts, [`RemoteCall`] describes one call and
//! [`RemoteReply`] is its fully buffered answer.
//!
//! # Example
//!
//! ```ignore
//! use tidewire_net::http::{HttpClient, HttpMethod};
//!
//! let client = HttpClient::builder().build()?;
//! let reply = client
//!     .call(HttpMethod::Post, &endpoint)
//!     .bearer_auth("access-token")
//!     .send()
//!     .await?;
//! if reply.is_success() {
//!     println!("{}", reply.body());
//! }
//! ```

mod call;
mod client;

pub use call::{HttpMethod, RemoteCall, RemoteReply};
pub use client::{HttpClient, HttpClientBuilder};
