//! In-process remote store.
//!
//! Behaves like a single Redis database (byte values, per-key expiry, flush)
//! without a server. Useful for tests and single-process deployments that
//! still want L2 semantics such as promotion.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::RemoteStore;
use crate::error::Result;

// Deadline used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes as-is, bypassing entry encoding. Lets tests plant
    /// corrupt or hand-built payloads.
    pub fn insert_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.items
            .lock()
            .insert(key.to_string(), (value, deadline_after(ttl)));
    }

    /// Raw bytes for a key, if present and live.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        let items = self.items.lock();
        items
            .get(key)
            .filter(|(_, deadline)| Instant::now() < *deadline)
            .map(|(value, _)| value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.items
            .lock()
            .values()
            .filter(|(_, deadline)| now < *deadline)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn deadline_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut items = self.items.lock();
        let live = items
            .get(key)
            .map(|(value, deadline)| (Instant::now() < *deadline).then(|| value.clone()));

        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                items.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.insert_raw(key, value.to_vec(), ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.items.lock().remove(key).is_some())
    }

    async fn flush(&self) -> Result<()> {
        self.items.lock().clear();
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip_and_delete() {
        let store = MemoryStore::new();

        store.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();

        store.set("k", b"v", Duration::from_millis(30)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_huge_ttl_does_not_overflow() {
        let store = MemoryStore::new();

        store.set("k", b"v", Duration::from_secs(u64::MAX / 2)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.contains("k"));
    }

    #[tokio::test]
    async fn test_memory_store_flush() {
        let store = MemoryStore::new();
        store.set("a", b"1", Duration::from_secs(60)).await.unwrap();
        store.set("b", b"2", Duration::from_secs(60)).await.unwrap();

        store.flush().await.unwrap();
        assert_eq!(store.len(), 0);
    }
}
