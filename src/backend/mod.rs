//! Distributed Backend Module
//!
//! The L2 tier. `RemoteStore` is the boundary to whatever key-value store
//! backs it; `DistributedCache` wraps a store and is the single place where
//! an unreachable backend is turned into misses instead of errors.

mod distributed;
mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use distributed::DistributedCache;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Raw byte key-value store with per-key expiry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Liveness probe
    async fn ping(&self) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Returns whether a key was removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key in the store's keyspace
    async fn flush(&self) -> Result<()>;

    /// Releases connections; later calls may fail
    async fn close(&self);
}
