//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache.
//!
//! # Tasks
//! - Janitor: removes expired entries from both tiers at configured intervals

mod janitor;

pub use janitor::Janitor;
