//! Error types for store operations.

use thiserror::Error;

/// Errors propagated by the write side of a [`Store`](crate::Store).
///
/// The read side never produces these; read corruption degrades to a
/// miss.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem error while persisting the record, body or index.
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata record could not be serialized.
    #[error("cache metadata serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
