#![warn(missing_docs)]
//! # memento-fs
//!
//! Filesystem [`Store`](memento_core::Store) implementation for the
//! memento caching proxy.
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/index        append-only "<key> <url>\n" audit lines
//! <root>/<key>/meta   pretty-printed JSON metadata record
//! <root>/<key>/body   body blob (HTML annotated, text coerced, else raw)
//! ```
//!
//! Reads fail open: anything missing or unparsable is reported as a miss.
//! Writes fail closed and overwrite the previous entry in place; there is
//! no locking, no versioning and no expiry — cache growth is unbounded and
//! externally managed.

mod store;

pub use store::{FsStore, FsStoreBuilder};
