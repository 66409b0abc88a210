//! Distributed cache adapter.
//!
//! Wraps a `RemoteStore` behind an enabled flag. Initialization failure
//! disables the adapter for its whole lifetime; per-call failures are logged
//! and reported as a miss or failed write. Nothing here returns an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{RedisStore, RemoteStore};
use crate::cache::CacheMetrics;
use crate::config::Config;

pub struct DistributedCache {
    store: Option<Arc<dyn RemoteStore>>,
    enabled: AtomicBool,
    metrics: Arc<CacheMetrics>,
}

impl DistributedCache {
    /// An adapter that never talks to a backend.
    pub fn disabled(metrics: Arc<CacheMetrics>) -> Self {
        Self {
            store: None,
            enabled: AtomicBool::new(false),
            metrics,
        }
    }

    /// Connects to Redis as configured. Missing configuration, an invalid
    /// URL or a failed liveness probe all yield a disabled adapter.
    pub async fn initialize(config: &Config, metrics: Arc<CacheMetrics>) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("No REDIS_URL configured, distributed cache disabled");
            return Self::disabled(metrics);
        };

        let timeout = Duration::from_millis(config.redis_timeout_ms);
        match RedisStore::connect(url, config.redis_max_connections, timeout) {
            Ok(store) => Self::with_store(Arc::new(store), metrics).await,
            Err(e) => {
                warn!(error = %e, "Failed to create Redis pool, distributed cache disabled");
                Self::disabled(metrics)
            }
        }
    }

    /// Wraps an existing store after probing it.
    pub async fn with_store(store: Arc<dyn RemoteStore>, metrics: Arc<CacheMetrics>) -> Self {
        match store.ping().await {
            Ok(()) => {
                info!("Distributed cache connected");
                Self {
                    store: Some(store),
                    enabled: AtomicBool::new(true),
                    metrics,
                }
            }
            Err(e) => {
                warn!(error = %e, "Distributed cache unreachable, running with local tier only");
                store.close().await;
                Self::disabled(metrics)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn active_store(&self) -> Option<&Arc<dyn RemoteStore>> {
        if self.is_enabled() {
            self.store.as_ref()
        } else {
            None
        }
    }

    /// Raw bytes for a key; `None` on miss, when disabled, or on failure.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let store = self.active_store()?;
        match store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Distributed cache GET failed");
                self.metrics.record_l2_error();
                None
            }
        }
    }

    /// Writes raw bytes with an expiry.
    ///
    /// A disabled adapter reports success: losing the distributed tier must
    /// not make writes fail.
    pub async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> bool {
        let Some(store) = self.active_store() else {
            return true;
        };
        match store.set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Distributed cache SET failed");
                self.metrics.record_l2_error();
                false
            }
        }
    }

    /// Returns whether the key existed; `false` when disabled or on failure.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(store) = self.active_store() else {
            return false;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(key = %key, error = %e, "Distributed cache DELETE failed");
                self.metrics.record_l2_error();
                false
            }
        }
    }

    /// Flushes the backend. A disabled adapter has nothing to flush and
    /// reports success.
    pub async fn clear(&self) -> bool {
        let Some(store) = self.active_store() else {
            return true;
        };
        match store.flush().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Distributed cache FLUSH failed");
                self.metrics.record_l2_error();
                false
            }
        }
    }

    /// Releases the backend. The adapter is disabled afterwards.
    pub async fn close(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            if let Some(store) = &self.store {
                store.close().await;
            }
            debug!("Distributed cache closed");
        }
    }
}
