#![warn(missing_docs)]
//! # memento
//!
//! A caching HTTP reverse proxy for development and testing workflows that
//! need deterministic, repeatable responses without repeatedly hitting a
//! live network.
//!
//! Two proxy modes are selected per request:
//!
//! - **Explicit-URL mode** — a query parameter carries an absolute URL to
//!   fetch (`GET /?url=http://example.com/a`, or the prefix form
//!   `GET /?http://example.com/a`). The origin response is fetched in one
//!   buffered round trip.
//! - **Transparent mode** — the request's own path and query are forwarded
//!   to a configured upstream, streaming the origin bytes to the client
//!   while accumulating them for the cache.
//!
//! Successful (status 200) responses are persisted through a
//! [`Store`](memento_core::Store) — by default the filesystem store from
//! `memento-fs` — and served from cache on subsequent requests for the
//! same target, with `X-Proxy-Cache-*` headers reporting what happened.

pub mod body;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forward;
pub mod respond;
pub mod server;

pub use config::ProxyConfig;
pub use dispatch::Dispatcher;
pub use error::ProxyError;
pub use forward::Forwarder;
