//! Cache Module
//!
//! Two-tier caching: a bounded in-process LRU (L1) in front of an optional
//! distributed store (L2), plus memoization and tenant-scoped views.

use std::time::Duration;

pub mod entry;
mod local;
mod lru;
mod memoize;
mod metrics;
mod scoped;
mod tiered;


// Re-export public types
pub use entry::CacheEntry;
pub use local::{LocalCache, LocalStats};
pub use lru::LruTracker;
pub use memoize::{CallKey, Memoizer, DEFAULT_KEY_PREFIX};
pub use metrics::{
    CacheMetrics, DistributedTierMetrics, LocalTierMetrics, MaintenanceMetrics, MetricsSnapshot,
    OverallMetrics,
};
pub use scoped::ScopedCache;
pub use tiered::{HealthReport, HealthStatus, TieredCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed encoded value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest TTL a write may carry; longer TTLs are clamped to it
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60); // 10 years
