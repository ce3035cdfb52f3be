//! Memory Store Module
//!
//! The in-process cache tier: a bounded map from key to serialized value
//! with lazy TTL expiration and access-recency eviction.

use std::collections::HashMap;

use tracing::debug;

use crate::key::CacheKey;
use crate::memory::{eviction, MemoryEntry};
use crate::stats::CacheStats;

// == Memory Store ==
/// Bounded in-process key-value storage with TTL and eviction.
///
/// The store itself is a plain struct; callers share it behind
/// `Arc<RwLock<MemoryStore>>` so concurrent gets, sets, and janitor sweeps
/// are serialized (reads mutate `accessed_at`, so they take the write lock
/// too).
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: HashMap<CacheKey, MemoryEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Soft ceiling on the number of entries
    max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new MemoryStore.
    ///
    /// # Arguments
    /// * `max_entries` - Soft ceiling on the entry count
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Get ==
    /// Retrieves the value bytes for a key.
    ///
    /// Expired entries are removed on access (lazy expiration) and counted
    /// as misses. A hit refreshes the entry's access timestamp.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<u8>> {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.is_expired() {
                // Lazy expiration: drop the stale entry on access
                self.entries.remove(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                return None;
            }

            entry.touch();
            let value = entry.value.clone();
            self.stats.record_hit();
            return Some(value);
        }

        self.stats.record_miss();
        None
    }

    // == Set ==
    /// Stores value bytes under a key with an optional TTL.
    ///
    /// Overwrites any existing entry and resets all of its timestamps.
    /// When the insertion pushes the entry count past the soft ceiling,
    /// the oldest-accessed 20% of entries are evicted.
    ///
    /// # Arguments
    /// * `key` - The derived cache key
    /// * `value` - The serialized value
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&mut self, key: CacheKey, value: Vec<u8>, ttl: Option<u64>) {
        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        self.entries
            .insert(key, MemoryEntry::new(value, effective_ttl));

        if self.entries.len() > self.max_entries {
            self.evict_if_over_capacity();
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Remove ==
    /// Removes an entry by key. Returns true if it existed.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Eviction ==
    /// Removes the oldest-accessed 20% of entries.
    fn evict_if_over_capacity(&mut self) {
        let victims = eviction::select_victims(&self.entries);
        let count = victims.len();

        for key in victims {
            self.entries.remove(&key);
            self.stats.record_eviction();
        }

        debug!(
            evicted = count,
            remaining = self.entries.len(),
            "memory tier evicted oldest-accessed entries"
        );
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed. Called by the background
    /// janitor; redundant with lazy expiration so that entries which are
    /// never read again still get reclaimed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current tier statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Contains ==
    /// Returns true if a live (non-expired) entry exists for the key,
    /// without touching its access time.
    pub fn contains_live(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }
}
