//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Cache errors are internal: the facade logs them and falls back to the
//! wrapped computation, so callers never observe a cache-originated error.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem error from the disk tier (read, write, evict, sweep)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
