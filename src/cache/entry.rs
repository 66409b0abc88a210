//! Cache Entry Module
//!
//! Defines the unit of storage shared by both tiers: the local cache holds it
//! directly, the distributed tier holds its JSON encoding.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Reads needed before an L2 entry is copied into L1.
pub const PROMOTION_THRESHOLD: u64 = 2;

/// Size assumed for a value whose encoded size cannot be measured.
pub const FALLBACK_SIZE_BYTES: usize = 1024;

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Successful reads since creation
    #[serde(default)]
    pub access_count: u64,
    /// Timestamp of the most recent read (Unix milliseconds)
    #[serde(default)]
    pub last_access: u64,
    /// Encoded size estimate, computed once at creation
    #[serde(default)]
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` from now.
    pub fn new(value: Value, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let size_bytes = estimate_size(&value);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
            access_count: 0,
            last_access: now,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired strictly after its expiration instant; at
    /// `now == expires_at` it is still readable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Original TTL the entry was created with.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(self.created_at))
    }

    /// Remaining lifetime, zero once expired (never negative).
    pub fn remaining_ttl(&self) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(current_timestamp_ms()))
    }

    // == Access Tracking ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access = current_timestamp_ms();
    }

    pub fn is_promotion_eligible(&self) -> bool {
        self.access_count >= PROMOTION_THRESHOLD
    }

    /// Fresh entry for the local tier carrying the same value and absolute
    /// expiry, so it lives exactly as long as the remaining TTL.
    pub fn promoted_copy(&self) -> Self {
        let now = current_timestamp_ms();
        Self {
            value: self.value.clone(),
            created_at: now,
            expires_at: self.expires_at,
            access_count: 0,
            last_access: now,
            size_bytes: self.size_bytes,
        }
    }

    // == Encoding ==
    /// Encodes the entry for the distributed tier.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes an entry read from the distributed tier.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Best-effort encoded size of a value.
pub fn estimate_size(value: &Value) -> usize {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or(FALLBACK_SIZE_BYTES)
}

/// Whole seconds for a remote-store expiry, rounded up and at least one.
pub fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(json!("test_value"), Duration::from_secs(60));

        assert_eq!(entry.value, json!("test_value"));
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.ttl(), Duration::from_secs(60));
        assert_eq!(entry.size_bytes, "\"test_value\"".len());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new(json!(1), Duration::from_secs(1 << 61));

        assert!(!entry.is_expired());
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(entry.ttl() > Duration::from_secs(1 << 40));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!("test"),
            created_at: now,
            expires_at: now,
            access_count: 0,
            last_access: now,
            size_bytes: 6,
        };

        assert!(!entry.is_expired_at(now), "Entry is still live at expires_at");
        assert!(entry.is_expired_at(now + 1), "Entry is expired after expires_at");
    }

    #[test]
    fn test_remaining_ttl_never_negative() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!(1),
            created_at: now - 10_000,
            expires_at: now - 5_000,
            access_count: 3,
            last_access: now - 6_000,
            size_bytes: 1,
        };

        assert!(entry.is_expired());
        assert_eq!(entry.remaining_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_touch_and_promotion_threshold() {
        let mut entry = CacheEntry::new(json!({"a": 1}), Duration::from_secs(60));

        entry.touch();
        assert_eq!(entry.access_count, 1);
        assert!(!entry.is_promotion_eligible());

        entry.touch();
        assert_eq!(entry.access_count, 2);
        assert!(entry.is_promotion_eligible());
    }

    #[test]
    fn test_bytes_preserve_metadata() {
        let mut entry = CacheEntry::new(
            json!({"nested": [1, 2, {"deep": true}], "name": "lead"}),
            Duration::from_secs(300),
        );
        entry.touch();

        let decoded = CacheEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(CacheEntry::from_bytes(b"\x00\x01not json").is_err());
    }

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_secs(300)), 300);
    }
}
