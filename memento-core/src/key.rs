//! Cache key derivation.
//!
//! A [`CacheKey`] is the storage namespace identifier for a target URL:
//! the lowercase hex SHA-256 digest of the URL string. Derivation is
//! total, deterministic and side-effect-free, so the same URL maps to the
//! same key across requests and process restarts.
//!
//! The digest is used purely as a stable fixed-width identifier that is
//! safe as a directory name. It is not a security property; key collisions
//! are an accepted correctness risk.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A cache key identifying the namespace of a cached entry.
///
/// # Example
///
/// ```
/// use memento_core::CacheKey;
///
/// let key = CacheKey::derive("http://example.com/a");
/// assert_eq!(key, CacheKey::derive("http://example.com/a"));
/// assert_eq!(key.as_str().len(), 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the cache key for a target URL.
    pub fn derive(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    /// Wraps a pre-computed key value.
    ///
    /// Intended for tests and tooling that address a namespace directly;
    /// regular callers go through [`CacheKey::derive`].
    pub fn new(raw: impl Into<String>) -> Self {
        CacheKey(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
