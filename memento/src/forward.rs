//! Forwarding strategies.
//!
//! One [`Forwarder`] owns the HTTP client for both transports: the
//! buffered request/response cycle used by explicit-URL mode, and the
//! streamed pass-through used by transparent mode. The client is
//! constructed once, owned by the server's lifetime and handed to the
//! dispatcher — there is no ambient global client.
//!
//! The client enables no content-decoding features, so captured bytes are
//! the origin's wire bytes. Redirects follow the client's default policy.
//! No per-request timeout is set here; the ceiling belongs to the server's
//! timeout layer, and an in-flight forward outlives it by design.

use bytes::Bytes;
use http::header::{HeaderMap, HOST};
use http::{Method, StatusCode};
use url::Url;

/// A buffered origin response: status, headers and the full body.
#[derive(Debug)]
pub struct Forwarded {
    /// Origin status code.
    pub status: StatusCode,
    /// Origin response headers.
    pub headers: HeaderMap,
    /// The complete response body.
    pub body: Bytes,
}

/// Executes network calls to origin servers.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Builds the forwarder and its HTTP client.
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Forwarder { client })
    }

    /// Buffered forward: one request/response cycle, full body captured.
    pub async fn fetch(&self, method: Method, url: &Url) -> reqwest::Result<Forwarded> {
        let response = self.client.request(method, url.clone()).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Forwarded {
            status,
            headers,
            body,
        })
    }

    /// Streamed forward: opens the origin response and returns it live,
    /// for the caller to tee to the client.
    ///
    /// The incoming request's method, headers and body pass through; the
    /// `Host` header is dropped so the client derives it from the target.
    pub async fn open(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: reqwest::Body,
    ) -> reqwest::Result<reqwest::Response> {
        headers.remove(HOST);
        self.client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
    }
}
