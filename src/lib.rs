//! Sitecache - A two-tier function-result cache
//!
//! Wraps arbitrary computations so their results are cached in a bounded
//! in-process tier and an optional on-disk tier, with TTL expiration,
//! size-bound eviction, and a background janitor.

pub mod config;
pub mod disk;
pub mod error;
pub mod facade;
pub mod key;
pub mod memory;
pub mod stats;
pub mod tasks;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use facade::{Cache, CachedFn, CachedOptions};
pub use key::{derive, CacheArgs, CacheKey, CallArgs};
pub use stats::CacheStats;
pub use tasks::Janitor;
