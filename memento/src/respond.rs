//! Client response coordination.
//!
//! Translates a resolved outcome — a cached entry, a buffered forward or a
//! live origin stream — into the client-visible response, including the
//! cache-status headers:
//!
//! - `X-Proxy-Cache-Hit`: `"true"` or `"false"`
//! - `X-Proxy-Cache-Hash`: the cache key
//! - `X-Proxy-Cache-Written`: write-back result, buffered miss path only
//!
//! Hit and buffered responses also carry a recomputed `Content-Length`.
//! On the streamed path the write-back finishes after the headers are on
//! the wire, so its result is logged rather than reported in a header.

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode};
use memento_core::{CacheKey, StoredEntry};

use crate::forward::Forwarded;

/// Name of the hit/miss marker header.
pub const CACHE_HIT: &str = "x-proxy-cache-hit";
/// Name of the cache key header.
pub const CACHE_HASH: &str = "x-proxy-cache-hash";
/// Name of the write-back result header.
pub const CACHE_WRITTEN: &str = "x-proxy-cache-written";

/// Builds the response for a cache hit. No network call was made.
///
/// Status and headers come from the stored metadata; a missing or
/// unparsable record degrades to status 200 with no copied headers.
pub fn cached(stored: StoredEntry, key: &CacheKey) -> Response {
    let body = stored.body.unwrap_or_default();
    let (status, mut headers) = match stored.meta {
        Some(meta) => (meta.status, meta.header_map()),
        None => (200, HeaderMap::new()),
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);

    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    headers.insert(CACHE_HIT, flag(true));
    headers.insert(CACHE_HASH, hash(key));
    build(status, headers, Body::from(body))
}

/// Builds the response for a buffered miss: origin status and headers,
/// recomputed `Content-Length`, and the write-back result.
pub fn forwarded(forwarded: Forwarded, key: &CacheKey, written: bool) -> Response {
    let Forwarded {
        status,
        mut headers,
        body,
    } = forwarded;

    // The body is re-emitted as one buffer; a stale chunked marker from
    // the origin would contradict the recomputed length.
    headers.remove(TRANSFER_ENCODING);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    headers.insert(CACHE_HIT, flag(false));
    headers.insert(CACHE_HASH, hash(key));
    headers.insert(CACHE_WRITTEN, flag(written));
    build(status, headers, Body::from(body))
}

/// Builds the response for a streamed miss: origin status and headers
/// pass through unchanged, the body streams as it arrives.
pub fn streamed<B>(status: StatusCode, mut headers: HeaderMap, key: &CacheKey, body: B) -> Response
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    headers.insert(CACHE_HIT, flag(false));
    headers.insert(CACHE_HASH, hash(key));
    build(status, headers, Body::new(body))
}

fn flag(value: bool) -> HeaderValue {
    HeaderValue::from_static(if value { "true" } else { "false" })
}

fn hash(key: &CacheKey) -> HeaderValue {
    HeaderValue::from_str(key.as_str()).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
}

fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
