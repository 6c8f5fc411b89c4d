//! Proxy error delegation.
//!
//! Forwarding failures are not retried anywhere; they surface through
//! [`ProxyError`] and its [`IntoResponse`] impl, the error-handling
//! collaborator the dispatcher hands failures to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced to the client on the miss path.
///
/// Cache hits never produce these; cache write failures are absorbed and
/// only reflected in the `X-Proxy-Cache-Written` header.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The buffered forward to the origin failed.
    #[error("origin fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// A transparent-mode request arrived with no upstream configured.
    #[error("no upstream target configured for transparent proxying")]
    MissingUpstream,

    /// The forwarding target could not be resolved against the upstream.
    #[error("invalid forwarding target `{0}`")]
    BadTarget(String),

    /// The detached forward task was cancelled or panicked.
    #[error("forward task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "proxy request failed");
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}
