//! Memory Entry Module
//!
//! Defines the structure for individual memory tier entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Memory Entry ==
/// A single memory tier entry: opaque value bytes plus timestamps.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    /// The stored value, already serialized by the facade
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last access timestamp (Unix milliseconds); refreshed on every read
    pub accessed_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl MemoryEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl_seconds` - TTL in seconds
    pub fn new(value: Vec<u8>, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            accessed_at: now,
            expires_at: now + ttl_seconds * 1000,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Touch ==
    /// Refreshes the last access timestamp.
    pub fn touch(&mut self) {
        self.accessed_at = current_timestamp_ms();
    }

    // == Time To Live ==
    /// Returns the remaining TTL in milliseconds (0 once expired).
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let entry = MemoryEntry::new(b"test_value".to_vec(), 60);

        assert_eq!(entry.value, b"test_value");
        assert_eq!(entry.created_at, entry.accessed_at);
        assert!(entry.expires_at > entry.created_at);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        // Create entry with 1 second TTL
        let entry = MemoryEntry::new(b"test_value".to_vec(), 1);

        assert!(!entry.is_expired());

        // Wait for expiration
        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_entry_touch_refreshes_access_time() {
        let mut entry = MemoryEntry::new(b"test_value".to_vec(), 60);
        let original = entry.accessed_at;

        sleep(Duration::from_millis(10));
        entry.touch();

        assert!(entry.accessed_at > original);
        // created_at is untouched by reads
        assert_eq!(entry.created_at, original);
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = MemoryEntry::new(b"test_value".to_vec(), 10);

        let remaining = entry.ttl_remaining_ms();
        assert!(remaining <= 10_000);
        assert!(remaining >= 9_000);
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = MemoryEntry::new(b"test_value".to_vec(), 1);

        sleep(Duration::from_millis(1100));

        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Entry whose expiry is exactly the creation instant
        let now = current_timestamp_ms();
        let entry = MemoryEntry {
            value: b"test".to_vec(),
            created_at: now,
            accessed_at: now,
            expires_at: now,
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
