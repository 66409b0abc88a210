//! Local Cache Module
//!
//! In-process L1 tier: a bounded map with LRU eviction and per-entry TTL.
//! One mutex guards the map and its LRU order together, so every operation
//! (get-and-touch, set-and-evict, delete, clear, sweep) is observed whole.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheEntry, CacheMetrics, LruTracker};

#[derive(Debug)]
struct LocalState {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_size: usize,
}

impl LocalState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.lru.remove(key);
        self.entries.remove(key)
    }

    /// Evicts in LRU order until within capacity, returning how many went.
    fn evict_to_capacity(&mut self) -> u64 {
        let mut evicted = 0;
        while self.entries.len() > self.max_size {
            match self.lru.evict_oldest() {
                Some(key) => {
                    self.entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

/// Point-in-time size information for the local tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalStats {
    pub entries: usize,
    pub max_size: usize,
    pub size_bytes: usize,
    pub utilization_percent: f64,
}

// == Local Cache ==
/// Thread-safe bounded LRU cache with TTL support.
#[derive(Debug)]
pub struct LocalCache {
    state: Mutex<LocalState>,
    default_ttl: Duration,
    metrics: Arc<CacheMetrics>,
}

impl LocalCache {
    // == Constructor ==
    /// Creates a new LocalCache.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries (at least one is always allowed)
    /// * `default_ttl` - TTL applied when `set` is given none
    /// * `metrics` - Shared recorder for hits, misses and evictions
    pub fn new(max_size: usize, default_ttl: Duration, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            state: Mutex::new(LocalState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                max_size: max_size.max(1),
            }),
            default_ttl,
            metrics,
        }
    }

    // == Get ==
    /// Retrieves a live value and marks it most recently used.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&self, key: &str) -> Option<Value> {
        let start = Instant::now();

        let value = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            match state.entries.get_mut(key) {
                Some(entry) if !entry.is_expired() => {
                    entry.touch();
                    state.lru.touch(key);
                    Some(entry.value.clone())
                }
                Some(_) => {
                    state.remove(key);
                    None
                }
                None => None,
            }
        };

        if value.is_some() {
            self.metrics.record_l1_hit(start.elapsed());
        } else {
            self.metrics.record_l1_miss(start.elapsed());
        }
        value
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    ///
    /// If the insert pushes the cache over capacity, least recently used
    /// entries are evicted until it fits again.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        self.insert(key, CacheEntry::new(value, ttl.unwrap_or(self.default_ttl)))
    }

    /// Stores a prepared entry as-is, keeping its timestamps.
    pub fn insert(&self, key: &str, entry: CacheEntry) -> bool {
        let evicted = {
            let mut state = self.state.lock();
            state.entries.insert(key.to_string(), entry);
            state.lru.touch(key);
            state.evict_to_capacity()
        };

        for _ in 0..evicted {
            self.metrics.record_eviction();
        }
        true
    }

    // == Delete ==
    /// Removes an entry, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().remove(key).is_some()
    }

    // == Clear ==
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.lru.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries without touching hit/miss metrics.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = crate::cache::entry::current_timestamp_ms();
        let mut state = self.state.lock();

        let expired_keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            state.remove(key);
        }
        expired_keys.len()
    }

    // == Resize ==
    /// Changes capacity; shrinking evicts in LRU order until within bounds.
    pub fn set_max_size(&self, max_size: usize) {
        let evicted = {
            let mut state = self.state.lock();
            state.max_size = max_size.max(1);
            state.evict_to_capacity()
        };

        for _ in 0..evicted {
            self.metrics.record_eviction();
        }
    }

    // == Stats ==
    pub fn stats(&self) -> LocalStats {
        let state = self.state.lock();
        let entries = state.entries.len();

        LocalStats {
            entries,
            max_size: state.max_size,
            size_bytes: state.entries.values().map(|e| e.size_bytes).sum(),
            utilization_percent: entries as f64 / state.max_size as f64 * 100.0,
        }
    }

    /// Returns a copy of the stored entry without touching it or recording metrics.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.state.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn local(max_size: usize) -> LocalCache {
        LocalCache::new(max_size, Duration::from_secs(300), Arc::new(CacheMetrics::new()))
    }

    #[test]
    fn test_local_set_and_get() {
        let cache = local(100);

        assert!(cache.set("key1", json!("value1"), None));
        assert_eq!(cache.get("key1"), Some(json!("value1")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_local_get_nonexistent() {
        let cache = local(100);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_local_overwrite() {
        let cache = local(100);

        cache.set("key1", json!("value1"), None);
        cache.set("key1", json!("value2"), None);

        assert_eq!(cache.get("key1"), Some(json!("value2")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_local_delete() {
        let cache = local(100);

        cache.set("key1", json!(1), None);
        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_local_ttl_expiration_removes_entry() {
        let cache = local(100);

        cache.set("key1", json!("value1"), Some(Duration::from_millis(50)));
        assert!(cache.get("key1").is_some());

        sleep(Duration::from_millis(80));

        assert_eq!(cache.get("key1"), None);
        assert!(!cache.contains("key1"), "Expired entry must be physically removed");
    }

    #[test]
    fn test_local_lru_scenario() {
        let cache = local(2);

        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        assert_eq!(cache.get("a"), Some(json!(1)));
        cache.set("c", json!(3), None);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("c"), Some(json!(3)));
    }

    #[test]
    fn test_local_eviction_counted() {
        let metrics = Arc::new(CacheMetrics::new());
        let cache = LocalCache::new(3, Duration::from_secs(300), metrics.clone());

        for i in 0..5 {
            cache.set(&format!("key{i}"), json!(i), None);
        }

        assert_eq!(cache.len(), 3);
        let snapshot = metrics.snapshot(cache.stats(), false);
        assert_eq!(snapshot.l1.evictions, 2);
    }

    #[test]
    fn test_local_get_touches_and_counts() {
        let cache = local(10);
        cache.set("key", json!("v"), None);

        cache.get("key");
        cache.get("key");

        let entry = cache.peek("key").unwrap();
        assert_eq!(entry.access_count, 2);
    }

    #[test]
    fn test_local_reads_do_not_move_expiry() {
        let cache = local(10);
        cache.set("key", json!({"nested": [1, 2]}), None);
        let expires_at = cache.peek("key").unwrap().expires_at;

        for _ in 0..5 {
            assert_eq!(cache.get("key"), Some(json!({"nested": [1, 2]})));
        }
        assert_eq!(cache.peek("key").unwrap().expires_at, expires_at);
    }

    #[test]
    fn test_local_cleanup_expired() {
        let metrics = Arc::new(CacheMetrics::new());
        let cache = LocalCache::new(100, Duration::from_secs(300), metrics.clone());

        cache.set("short", json!(1), Some(Duration::from_millis(30)));
        cache.set("long", json!(2), Some(Duration::from_secs(10)));
        sleep(Duration::from_millis(60));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("long"));

        // Sweeps leave hit/miss counters alone
        let snapshot = metrics.snapshot(cache.stats(), false);
        assert_eq!(snapshot.overall.total_requests, 0);
    }

    #[test]
    fn test_local_shrink_evicts_lru() {
        let cache = local(4);
        for key in ["a", "b", "c", "d"] {
            cache.set(key, json!(key), None);
        }
        cache.get("a");

        cache.set_max_size(2);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_local_stats() {
        let cache = local(4);
        cache.set("a", json!("xy"), None);
        cache.set("b", json!(12), None);

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.max_size, 4);
        assert_eq!(stats.size_bytes, 4 + 2);
        assert_eq!(stats.utilization_percent, 50.0);
    }

    #[test]
    fn test_local_clear() {
        let cache = local(4);
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
