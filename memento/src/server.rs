//! Server wiring.
//!
//! The proxy is one fallback handler behind request tracing and a
//! per-request timeout ceiling. The timeout finalizes the client response
//! only; a forward already in flight keeps running (and writing back)
//! detached from it.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use memento_core::Store;
use memento_fs::FsStore;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::ProxyConfig;
use crate::dispatch::Dispatcher;
use crate::error::ProxyError;
use crate::forward::Forwarder;

/// Builds the proxy router around a dispatcher.
///
/// Every method and path lands in the same dispatch handler; the router
/// exists to carry the middleware stack.
pub fn router<S>(dispatcher: Dispatcher<S>, timeout: Duration) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .fallback(dispatch_any::<S>)
        .with_state(dispatcher)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch_any<S>(
    State(dispatcher): State<Dispatcher<S>>,
    req: Request,
) -> Result<Response, ProxyError>
where
    S: Store + 'static,
{
    dispatcher.dispatch(req).await
}

/// Runs the proxy server until the listener fails.
pub async fn run(config: ProxyConfig) -> io::Result<()> {
    if !config.enabled {
        tracing::warn!("proxy disabled by configuration");
        return Ok(());
    }

    let config = Arc::new(config);
    let store = Arc::new(FsStore::builder().root(&config.cache_root).build());
    let forwarder = Forwarder::new().map_err(io::Error::other)?;
    let dispatcher = Dispatcher::new(store, forwarder, Arc::clone(&config));
    let app = router(dispatcher, config.timeout);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        cache_root = %config.cache_root.display(),
        upstream = config.upstream.as_ref().map(Url::as_str).unwrap_or("none"),
        "listening"
    );
    axum::serve(listener, app).await
}
