//! Eviction Policy Module
//!
//! Selects memory tier eviction victims by access recency.

use std::collections::HashMap;

use crate::key::CacheKey;
use crate::memory::MemoryEntry;

// == Constants ==
/// Fraction of entries removed per eviction pass.
///
/// The ceiling is soft: eviction removes a fixed fraction of the tier
/// rather than the exact overage, so the entry count can sit above the
/// ceiling between passes.
pub const EVICTION_FRACTION: f64 = 0.2;

// == Victim Selection ==
/// Returns the keys of the oldest-accessed 20% of entries (at least one).
///
/// This approximates LRU: recency of access drives the choice, but the
/// cutoff is a percentage of the tier, not a precise over-capacity count.
pub fn select_victims(entries: &HashMap<CacheKey, MemoryEntry>) -> Vec<CacheKey> {
    if entries.is_empty() {
        return Vec::new();
    }

    let count = ((entries.len() as f64 * EVICTION_FRACTION) as usize).max(1);

    let mut by_access: Vec<(&CacheKey, u64)> = entries
        .iter()
        .map(|(key, entry)| (key, entry.accessed_at))
        .collect();
    by_access.sort_by_key(|(_, accessed_at)| *accessed_at);

    by_access
        .into_iter()
        .take(count)
        .map(|(key, _)| key.clone())
        .collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{derive, CallArgs};

    fn entry_accessed_at(accessed_at: u64) -> MemoryEntry {
        MemoryEntry {
            value: b"v".to_vec(),
            created_at: accessed_at,
            accessed_at,
            expires_at: u64::MAX,
        }
    }

    fn key(tag: u32) -> CacheKey {
        derive("victim_test", &CallArgs::new().arg(tag))
    }

    #[test]
    fn test_select_victims_empty() {
        let entries = HashMap::new();
        assert!(select_victims(&entries).is_empty());
    }

    #[test]
    fn test_select_victims_at_least_one() {
        let mut entries = HashMap::new();
        entries.insert(key(1), entry_accessed_at(100));
        entries.insert(key(2), entry_accessed_at(200));

        // 20% of 2 rounds down to 0; the floor of one keeps eviction moving
        assert_eq!(select_victims(&entries).len(), 1);
    }

    #[test]
    fn test_select_victims_picks_oldest_accessed() {
        let mut entries = HashMap::new();
        for i in 0..10u32 {
            entries.insert(key(i), entry_accessed_at(1000 + i as u64));
        }

        let victims = select_victims(&entries);
        assert_eq!(victims.len(), 2);
        assert!(victims.contains(&key(0)));
        assert!(victims.contains(&key(1)));
    }

    #[test]
    fn test_select_victims_fraction_of_len() {
        let mut entries = HashMap::new();
        for i in 0..50u32 {
            entries.insert(key(i), entry_accessed_at(i as u64));
        }

        assert_eq!(select_victims(&entries).len(), 10);
    }
}
