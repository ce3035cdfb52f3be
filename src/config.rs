//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Read once at process start and immutable thereafter; every component that
/// needs a value receives a clone.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Master switch; when false the facade always invokes the computation directly
    pub enabled: bool,
    /// Root directory for the disk tier
    pub cache_dir: PathBuf,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Soft ceiling on the number of memory tier entries
    pub max_entries: usize,
    /// Ceiling on the total size of disk tier files, in bytes
    pub max_size_bytes: u64,
    /// Background janitor sweep interval in seconds
    pub cleanup_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk tier root directory (default: "cache")
    /// - `CACHE_ENABLED` - Whether caching is active (default: true)
    /// - `CACHE_TTL` - Default TTL in seconds (default: 3600)
    /// - `CACHE_MAX_ENTRIES` - Memory tier entry ceiling (default: 100)
    /// - `CACHE_MAX_SIZE` - Disk tier size ceiling in bytes (default: 100 MiB)
    /// - `CACHE_CLEANUP_INTERVAL` - Janitor frequency in seconds (default: 3600)
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cache")),
            default_ttl: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            max_size_bytes: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100 * 1024 * 1024),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: PathBuf::from("cache"),
            default_ttl: 3600,
            max_entries: 100,
            max_size_bytes: 100 * 1024 * 1024,
            cleanup_interval: 3600,
        }
    }
}

/// Parses common boolean spellings ("true"/"false", "1"/"0", "yes"/"no").
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
