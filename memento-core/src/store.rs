//! The persistence seam between the dispatcher and a cache backend.
//!
//! The trait signatures encode the cache's asymmetric error policy:
//!
//! - [`Store::read`] is infallible. A missing, unreadable or unparsable
//!   record degrades to `None` — corruption is indistinguishable from a
//!   miss for the caller.
//! - [`Store::write`] fails closed: any persistence error is propagated.
//!
//! Stores perform no locking. Concurrent writes to the same key race and
//! the last write wins; callers must not rely on any other ordering.

use async_trait::async_trait;
use bytes::Bytes;

use crate::entry::{CacheEntry, CacheMeta};
use crate::error::StoreError;
use crate::key::CacheKey;

/// Result type for fallible store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The outcome of reading a key: whatever survived on disk.
#[derive(Clone, Debug, Default)]
pub struct StoredEntry {
    /// The metadata record, when present and parseable.
    pub meta: Option<CacheMeta>,
    /// The stored body blob, when present.
    pub body: Option<Bytes>,
}

impl StoredEntry {
    /// Whether this entry counts as a cache hit: a non-empty body is
    /// present. Metadata alone is not enough to serve from cache.
    pub fn is_hit(&self) -> bool {
        self.body.as_ref().is_some_and(|body| !body.is_empty())
    }
}

/// A cache persistence backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads whatever is stored under `key`. Never fails.
    async fn read(&self, key: &CacheKey) -> StoredEntry;

    /// Persists an entry.
    ///
    /// Returns `Ok(false)` with no side effects when the entry's status is
    /// not 200. Returns `Ok(true)` once the entry is persisted; an empty
    /// body still persists the metadata record. Any I/O or serialization
    /// failure is propagated.
    async fn write(&self, entry: &CacheEntry) -> StoreResult<bool>;
}
