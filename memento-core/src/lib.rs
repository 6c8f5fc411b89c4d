#![warn(missing_docs)]
//! # memento-core
//!
//! Core types for the memento caching proxy.
//!
//! This crate defines the vocabulary shared by the proxy service and its
//! storage backends:
//!
//! - **Derive** cache keys from target URLs ([`CacheKey`])
//! - **Model** captured origin responses ([`CacheMeta`], [`CacheEntry`])
//! - **Select** how a body is persisted ([`BodyFormat`])
//! - **Persist** entries behind one seam ([`Store`])
//!
//! The [`Store`] signatures encode the cache's asymmetric error policy:
//! reads cannot fail (corruption degrades to a miss), writes propagate
//! their errors to the caller.

pub mod body;
pub mod entry;
pub mod error;
pub mod key;
pub mod store;

pub use body::BodyFormat;
pub use entry::{CacheEntry, CacheMeta, HeaderRecord, HeaderValues};
pub use error::StoreError;
pub use key::CacheKey;
pub use store::{Store, StoreResult, StoredEntry};
