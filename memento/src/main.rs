//! The memento proxy binary.
//!
//! Configuration comes from the environment:
//!
//! - `PROXY_PORT` — listen port (default 7777)
//! - `PROXY_UPSTREAM` — transparent-mode forwarding target
//! - `PROXY_TIMEOUT` — per-request timeout in seconds (default 10)
//! - `PROXY_VERBOSE` — `1`/`true` raises the default log level to debug
//! - `TMP` — cache root directory (default: OS temp dir)
//!
//! `RUST_LOG` overrides the default filter entirely.

use std::io;
use std::time::Duration;

use memento::config::ProxyConfig;
use memento::server;
use tracing_subscriber::EnvFilter;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let verbose = env_flag("PROXY_VERBOSE");
    let default_filter = if verbose { "memento=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut builder = ProxyConfig::builder().verbose(verbose);
    if let Some(port) = std::env::var("PROXY_PORT").ok().and_then(|p| p.parse().ok()) {
        builder = builder.port(port);
    }
    if let Ok(upstream) = std::env::var("PROXY_UPSTREAM") {
        builder = builder.upstream(upstream);
    }
    if let Some(secs) = std::env::var("PROXY_TIMEOUT").ok().and_then(|t| t.parse().ok()) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Ok(tmp) = std::env::var("TMP") {
        builder = builder.cache_root(tmp);
    }

    let config = builder.build().map_err(io::Error::other)?;
    server::run(config).await
}
