//! Memory Tier Module
//!
//! Provides the in-process cache tier with TTL expiration and
//! access-recency eviction.

mod entry;
mod eviction;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, MemoryEntry};
pub use eviction::EVICTION_FRACTION;
pub use store::MemoryStore;
