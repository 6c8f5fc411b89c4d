//! Per-request proxy orchestration.
//!
//! The dispatcher is state-free per request: it selects the proxy mode,
//! derives the cache key, consults the store, and on a miss invokes the
//! matching forwarding strategy and triggers write-back.
//!
//! Cache reads and writes on the same key are not mutually exclusive.
//! Concurrent first-time requests for one URL each fetch from the origin
//! and each write, racing to last-write-wins; there is no lock, no
//! version stamp and no in-flight deduplication.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use http::Method;
use memento_core::{CacheEntry, CacheKey, CacheMeta, Store};
use url::Url;
use url::form_urlencoded;

use crate::body::TeeBody;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::forward::Forwarder;
use crate::respond;

/// The proxy mode resolved for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ProxyMode {
    /// A query parameter carried an absolute URL to fetch.
    Explicit(Url),
    /// The request's own path and query are the target.
    Transparent(String),
}

/// Per-request orchestrator. One instance serves the whole server; all
/// state is shared handles.
pub struct Dispatcher<S> {
    store: Arc<S>,
    forwarder: Forwarder,
    config: Arc<ProxyConfig>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Dispatcher {
            store: Arc::clone(&self.store),
            forwarder: self.forwarder.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Dispatcher<S>
where
    S: Store + 'static,
{
    /// Creates a dispatcher over a store, a forwarder and the validated
    /// configuration.
    pub fn new(store: Arc<S>, forwarder: Forwarder, config: Arc<ProxyConfig>) -> Self {
        Dispatcher {
            store,
            forwarder,
            config,
        }
    }

    /// Handles one request end to end.
    pub async fn dispatch(&self, req: Request) -> Result<Response, ProxyError> {
        match select_mode(&req) {
            ProxyMode::Explicit(target) => {
                tracing::debug!(
                    method = %req.method(),
                    uri = %req.uri(),
                    target = %target,
                    "explicit-url proxy"
                );
                self.explicit(req.method().clone(), target).await
            }
            ProxyMode::Transparent(target) => {
                tracing::debug!(
                    method = %req.method(),
                    uri = %req.uri(),
                    target = %target,
                    "transparent proxy"
                );
                self.transparent(req, target).await
            }
        }
    }

    /// Explicit-URL mode: buffered forward, write-back before the
    /// response is emitted so the result is reportable in a header.
    async fn explicit(&self, method: Method, target: Url) -> Result<Response, ProxyError> {
        let key = CacheKey::derive(target.as_str());
        let stored = self.store.read(&key).await;
        if stored.is_hit() {
            return Ok(respond::cached(stored, &key));
        }

        let store = Arc::clone(&self.store);
        let forwarder = self.forwarder.clone();
        let task_key = key.clone();
        // Detached from the response future: if a client-side timeout
        // finalizes the response, the forward and its write-back still
        // run to completion.
        let outcome = tokio::spawn(async move {
            let forwarded = forwarder.fetch(method, &target).await?;
            let meta = CacheMeta::from_origin(
                task_key,
                target.as_str(),
                forwarded.status.as_u16(),
                &forwarded.headers,
            );
            let entry = CacheEntry::new(meta, forwarded.body.clone());
            let written = match store.write(&entry).await {
                Ok(written) => written,
                Err(error) => {
                    tracing::warn!(key = %entry.meta.key, %error, "cache write failed");
                    false
                }
            };
            Ok::<_, reqwest::Error>((forwarded, written))
        })
        .await?;

        let (forwarded, written) = outcome?;
        Ok(respond::forwarded(forwarded, &key, written))
    }

    /// Transparent mode: streamed pass-through with write-back after the
    /// origin stream ends.
    async fn transparent(&self, req: Request, target: String) -> Result<Response, ProxyError> {
        let key = CacheKey::derive(&target);
        let stored = self.store.read(&key).await;
        if stored.is_hit() {
            return Ok(respond::cached(stored, &key));
        }

        let upstream = self
            .config
            .upstream
            .as_ref()
            .ok_or(ProxyError::MissingUpstream)?;
        let url = upstream
            .join(&target)
            .map_err(|_| ProxyError::BadTarget(target.clone()))?;

        let (parts, body) = req.into_parts();
        let outbound = reqwest::Body::wrap_stream(body.into_data_stream());
        let response = self
            .forwarder
            .open(parts.method, url, parts.headers, outbound)
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let (tee, accumulated) = TeeBody::new(response.bytes_stream());

        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let task_headers = headers.clone();
        tokio::spawn(async move {
            let Ok(body) = accumulated.await else {
                tracing::debug!(key = %task_key, "stream did not complete; skipping cache write");
                return;
            };
            let meta = CacheMeta::from_origin(task_key, target, status.as_u16(), &task_headers);
            let entry = CacheEntry::new(meta, body);
            match store.write(&entry).await {
                Ok(written) => {
                    tracing::debug!(key = %entry.meta.key, written, "streamed cache write")
                }
                Err(error) => {
                    tracing::warn!(key = %entry.meta.key, %error, "cache write failed")
                }
            }
        });

        Ok(respond::streamed(status, headers, &key, tee))
    }
}

/// Resolves the proxy mode for a request.
fn select_mode(req: &Request<Body>) -> ProxyMode {
    if let Some(query) = req.uri().query() {
        if let Some(target) = explicit_target(query) {
            return ProxyMode::Explicit(target);
        }
    }
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    ProxyMode::Transparent(target)
}

/// Picks the explicit-mode candidate from a query string.
///
/// The conventional `url` parameter's value is tried first; with no (or
/// an empty) `url` parameter, the first parameter's *name* is tried — the
/// prefix form `?http://host/path` carries the target as a bare key.
fn explicit_target(query: &str) -> Option<Url> {
    let mut pairs = form_urlencoded::parse(query.as_bytes());
    let named = pairs
        .clone()
        .find(|(name, _)| name == "url")
        .map(|(_, value)| value.into_owned());
    let candidate = match named {
        Some(value) if !value.is_empty() => value,
        _ => pairs.next().map(|(name, _)| name.into_owned())?,
    };
    parse_absolute(&candidate)
}

/// Accepts only well-formed absolute http(s) URLs, checked by
/// case-insensitive scheme prefix and a full parse.
fn parse_absolute(candidate: &str) -> Option<Url> {
    let prefixed = candidate
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("http:"))
        || candidate
            .get(..6)
            .is_some_and(|p| p.eq_ignore_ascii_case("https:"));
    if !prefixed {
        return None;
    }
    Url::parse(candidate).ok()
}
