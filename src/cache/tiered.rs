//! Tiered Cache Module
//!
//! Composes the local L1 tier with the distributed L2 tier.
//!
//! # Read path
//! 1. L1 hit returns immediately.
//! 2. Otherwise L2 is consulted; a missing, undecodable or expired entry is a
//!    miss (the latter two are also deleted from L2).
//! 3. A live L2 entry has its access count bumped. From the second read on
//!    it is promoted into L1 with its remaining TTL, and the updated entry
//!    is written back to L2 according to the write-back policy.
//!
//! # Write path
//! `set` writes both tiers with the same absolute expiry. A disabled L2
//! counts as a successful write.
//!
//! The two tiers are not updated atomically with respect to each other; a
//! key may briefly be fresher in one tier than the other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::backend::{DistributedCache, RemoteStore};
use crate::cache::entry::{current_timestamp_ms, PROMOTION_THRESHOLD};
use crate::cache::{
    CacheEntry, CacheMetrics, LocalCache, Memoizer, MetricsSnapshot, ScopedCache, MAX_TTL,
};
use crate::config::Config;
use crate::tasks::{spawn_maintenance, MaintenanceHandle};

struct Inner {
    local: Arc<LocalCache>,
    remote: DistributedCache,
    metrics: Arc<CacheMetrics>,
    config: Config,
    maintenance: Mutex<Option<MaintenanceHandle>>,
}

// == Tiered Cache ==
/// Handle to a two-tier cache. Cloning is cheap and every clone shares the
/// same tiers, metrics and maintenance task.
#[derive(Clone)]
pub struct TieredCache {
    inner: Arc<Inner>,
}

impl TieredCache {
    // == Constructors ==
    /// Builds the cache and connects the distributed tier as configured.
    /// An unreachable or unconfigured backend leaves L2 disabled.
    pub async fn connect(config: Config) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        let remote = DistributedCache::initialize(&config, metrics.clone()).await;
        Self::assemble(config, metrics, remote)
    }

    /// Builds the cache on top of a caller-supplied remote store.
    pub async fn with_store(config: Config, store: Arc<dyn RemoteStore>) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        let remote = DistributedCache::with_store(store, metrics.clone()).await;
        Self::assemble(config, metrics, remote)
    }

    /// Builds a cache whose distributed tier is permanently disabled.
    pub fn local_only(config: Config) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        let remote = DistributedCache::disabled(metrics.clone());
        Self::assemble(config, metrics, remote)
    }

    fn assemble(config: Config, metrics: Arc<CacheMetrics>, remote: DistributedCache) -> Self {
        let local = Arc::new(LocalCache::new(
            config.l1_max_entries,
            config.default_ttl(),
            metrics.clone(),
        ));

        info!(
            l1_max_entries = config.l1_max_entries,
            default_ttl = config.l1_default_ttl,
            l2_enabled = remote.is_enabled(),
            "Tiered cache initialized"
        );

        Self {
            inner: Arc::new(Inner {
                local,
                remote,
                metrics,
                config,
                maintenance: Mutex::new(None),
            }),
        }
    }

    // == Get ==
    /// Retrieves a value and decodes it as `T`.
    ///
    /// A stored value that does not decode as `T` is returned as `None`.
    /// The tier lookup itself succeeded, so metrics still count it as a hit
    /// for whichever tier served it; the mismatch is only logged.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Retrieves the raw JSON value through both tiers.
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        let inner = &self.inner;

        if let Some(value) = inner.local.get(key) {
            debug!(key = %key, "cache hit (L1)");
            return Some(value);
        }

        let start = Instant::now();
        let Some(bytes) = inner.remote.get(key).await else {
            debug!(key = %key, "cache miss");
            inner.metrics.record_l2_miss(start.elapsed());
            return None;
        };

        let mut entry = match CacheEntry::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping undecodable L2 entry");
                inner.remote.delete(key).await;
                inner.metrics.record_l2_miss(start.elapsed());
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key = %key, "expired entry in L2");
            inner.remote.delete(key).await;
            inner.metrics.record_l2_miss(start.elapsed());
            return None;
        }

        entry.touch();
        let remaining = entry.remaining_ttl();
        let promoted = entry.is_promotion_eligible();

        if promoted {
            inner.local.insert(key, entry.promoted_copy());
            debug!(key = %key, access_count = entry.access_count, "promoted to L1");
        }

        if self.should_write_back(entry.access_count) {
            match entry.to_bytes() {
                Ok(bytes) => {
                    inner.remote.set(key, &bytes, remaining).await;
                }
                Err(e) => warn!(key = %key, error = %e, "Failed to encode entry for write-back"),
            }
        }

        debug!(key = %key, "cache hit (L2)");
        inner.metrics.record_l2_hit(start.elapsed(), promoted);
        Some(entry.value)
    }

    // == Batch Operations ==
    /// Reads each key through the normal read path. Only keys that were
    /// found and decoded appear in the result.
    pub async fn get_many<T, K>(&self, keys: &[K]) -> HashMap<String, T>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            if let Some(value) = self.get::<T>(key).await {
                found.insert(key.to_string(), value);
            }
        }
        found
    }

    /// Writes every item with the same TTL. True only if all writes
    /// succeeded; a failed item does not stop the rest.
    pub async fn set_many<K, T, I>(&self, items: I, ttl: Option<Duration>) -> bool
    where
        K: AsRef<str>,
        T: Serialize,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut all_stored = true;
        for (key, value) in items {
            all_stored &= self.set(key.as_ref(), &value, ttl).await;
        }
        all_stored
    }

    /// Whether either tier holds a live entry for `key`. Does not count
    /// as a read: no metrics, access counts or promotion.
    pub async fn exists(&self, key: &str) -> bool {
        let inner = &self.inner;
        if inner.local.peek(key).is_some_and(|entry| !entry.is_expired()) {
            return true;
        }

        match inner.remote.get(key).await {
            Some(bytes) => CacheEntry::from_bytes(&bytes).is_ok_and(|entry| !entry.is_expired()),
            None => false,
        }
    }

    /// Until promotion every read is written back so eligibility survives
    /// restarts; afterwards only every `l2_writeback_every`-th read is.
    fn should_write_back(&self, access_count: u64) -> bool {
        let every = self.inner.config.l2_writeback_every.max(1);
        access_count <= PROMOTION_THRESHOLD || access_count % every == 0
    }

    // == Set ==
    /// Stores a serializable value in both tiers.
    ///
    /// Returns `false` if the value cannot be serialized or the enabled L2
    /// rejected the write.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.set_value(key, value, ttl).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Value is not serializable, not cached");
                false
            }
        }
    }

    /// Stores a JSON value in both tiers.
    pub async fn set_value(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let inner = &self.inner;
        let ttl = ttl.unwrap_or_else(|| inner.local.default_ttl()).min(MAX_TTL);
        let entry = CacheEntry::new(value, ttl);

        let encoded = entry.to_bytes();
        let l1_ok = inner.local.insert(key, entry);

        let l2_ok = match encoded {
            Ok(bytes) => inner.remote.set(key, &bytes, ttl).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode entry for L2");
                false
            }
        };

        l1_ok && l2_ok
    }

    // == Delete ==
    /// Removes a key from both tiers; true if either held it.
    pub async fn delete(&self, key: &str) -> bool {
        let l1 = self.inner.local.delete(key);
        let l2 = self.inner.remote.delete(key).await;
        l1 || l2
    }

    // == Clear ==
    /// Empties both tiers. Reports the L2 flush result.
    pub async fn clear(&self) -> bool {
        self.inner.local.clear();
        let flushed = self.inner.remote.clear().await;
        info!(l2_flushed = flushed, "Cache cleared");
        flushed
    }

    // == Get Or Compute ==
    /// Returns the cached value or computes, stores and returns it.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return cached;
        }

        let start = Instant::now();
        let value = compute().await;
        debug!(key = %key, compute_ms = start.elapsed().as_millis() as u64, "computed on miss");

        self.set(key, &value, ttl).await;
        value
    }

    /// Like `get_or_compute` for fallible computations. Errors are
    /// returned to the caller and never cached.
    pub async fn try_get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    // == Metrics ==
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner
            .metrics
            .snapshot(self.inner.local.stats(), self.inner.remote.is_enabled())
    }

    // == Health Check ==
    /// Round-trips a probe value through the cache.
    pub async fn health_check(&self) -> HealthReport {
        let now = current_timestamp_ms();
        let probe_key = format!("health_check:{now}");
        let probe = json!({ "timestamp": now, "test": true });

        let stored = self.set_value(&probe_key, probe.clone(), Some(Duration::from_secs(30))).await;
        let read_back = self.get_value(&probe_key).await;
        self.delete(&probe_key).await;

        let status = if stored && read_back.as_ref() == Some(&probe) {
            HealthStatus::Healthy
        } else {
            warn!(stored, "Cache health probe failed");
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            l2_enabled: self.inner.remote.is_enabled(),
            l1_entries: self.inner.local.len(),
        }
    }

    // == Lifecycle ==
    /// Starts the background maintenance task. Returns `false` if it is
    /// already running.
    pub fn start(&self) -> bool {
        let mut slot = self.inner.maintenance.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        *slot = Some(spawn_maintenance(
            self.inner.local.clone(),
            self.inner.metrics.clone(),
            self.inner.config.cleanup_interval(),
        ));
        true
    }

    /// Stops the maintenance task, waiting up to the configured grace
    /// period before aborting it. Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let handle = self.inner.maintenance.lock().take();
        match handle {
            Some(handle) => {
                handle.stop(self.inner.config.shutdown_grace()).await;
                true
            }
            None => false,
        }
    }

    /// Stops maintenance and releases the distributed backend.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.inner.remote.close().await;
    }

    /// Runs `f` with maintenance active, stopping it afterwards.
    pub async fn run_scoped<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce(TieredCache) -> Fut,
        Fut: Future<Output = T>,
    {
        let started = self.start();
        let output = f(self.clone()).await;
        if started {
            self.stop().await;
        }
        output
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .maintenance
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Views ==
    /// Memoizing wrapper for the function identified by `name`.
    pub fn memoizer(&self, name: impl Into<String>) -> Memoizer {
        Memoizer::new(self.clone(), name)
    }

    /// View that namespaces every key under `scope`.
    pub fn scoped(&self, scope: impl AsRef<str>) -> ScopedCache {
        ScopedCache::new(self.clone(), scope)
    }

    pub fn local(&self) -> &LocalCache {
        &self.inner.local
    }

    pub fn is_distributed_enabled(&self) -> bool {
        self.inner.remote.is_enabled()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

// == Health Types ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub l2_enabled: bool,
    pub l1_entries: usize,
}
