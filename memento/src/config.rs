//! Proxy configuration.
//!
//! One explicit record with documented defaults, validated once at
//! construction and shared by reference through the call chain.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Whether the proxy starts at all.
pub const DEFAULT_ENABLED: bool = true;
/// Whether per-operation cache/proxy logs are emitted by default.
pub const DEFAULT_VERBOSE: bool = false;
/// Default listen port.
pub const DEFAULT_PORT: u16 = 7777;
/// Default per-request timeout ceiling.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated proxy configuration.
///
/// Build one with [`ProxyConfig::builder`]; fields are public because the
/// record is immutable after validation.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// When false, [`run`](crate::server::run) logs and returns without
    /// binding.
    pub enabled: bool,
    /// Raises the default log filter chosen by the binary.
    pub verbose: bool,
    /// Listen address. Defaults to 0.0.0.0.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Per-request timeout, enforced by the server's timeout layer. An
    /// in-flight forward is not cancelled when it fires.
    pub timeout: Duration,
    /// Cache root directory. Defaults to the OS temporary directory.
    pub cache_root: PathBuf,
    /// Forwarding target for transparent mode. Transparent requests fail
    /// when unset.
    pub upstream: Option<Url>,
}

impl ProxyConfig {
    /// Starts building a configuration.
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::default()
    }

    /// The socket address to bind.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Errors rejected at configuration build time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The hostname is not a usable listen address.
    #[error("invalid hostname `{0}`")]
    InvalidHostname(String),

    /// The upstream target is not an absolute http(s) URL.
    #[error("invalid upstream `{0}`: {1}")]
    InvalidUpstream(String, String),

    /// The per-request timeout is zero.
    #[error("timeout must be non-zero")]
    ZeroTimeout,
}

/// Builder for [`ProxyConfig`].
#[derive(Debug)]
pub struct ProxyConfigBuilder {
    enabled: bool,
    verbose: bool,
    hostname: Option<String>,
    port: u16,
    timeout: Duration,
    cache_root: Option<PathBuf>,
    upstream: Option<String>,
}

impl Default for ProxyConfigBuilder {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            verbose: DEFAULT_VERBOSE,
            hostname: None,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            cache_root: None,
            upstream: None,
        }
    }
}

impl ProxyConfigBuilder {
    /// Enables or disables the proxy entirely.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Emits per-operation cache/proxy logs.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Listen address. Must parse as an IP address.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Listen port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Per-request timeout ceiling.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cache root directory.
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Upstream target for transparent mode.
    pub fn upstream(mut self, upstream: impl Into<String>) -> Self {
        self.upstream = Some(upstream.into());
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<ProxyConfig, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let host = match self.hostname {
            Some(hostname) => hostname
                .parse()
                .map_err(|_| ConfigError::InvalidHostname(hostname))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let upstream = match self.upstream {
            Some(raw) => Some(parse_upstream(&raw)?),
            None => None,
        };

        Ok(ProxyConfig {
            enabled: self.enabled,
            verbose: self.verbose,
            host,
            port: self.port,
            timeout: self.timeout,
            cache_root: self.cache_root.unwrap_or_else(std::env::temp_dir),
            upstream,
        })
    }
}

fn parse_upstream(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|error| ConfigError::InvalidUpstream(raw.to_owned(), error.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUpstream(
            raw.to_owned(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUpstream(
            raw.to_owned(),
            "missing host".to_owned(),
        ));
    }
    Ok(url)
}
