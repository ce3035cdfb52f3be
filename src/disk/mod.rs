//! Disk Tier Module
//!
//! Provides the on-disk cache tier with mtime-based expiration and
//! size-bound eviction.

mod store;

// Re-export public types
pub use store::DiskStore;
