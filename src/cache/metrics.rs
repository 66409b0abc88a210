//! Cache Metrics Module
//!
//! Process-wide counters for both tiers and the maintenance task. Counters
//! are atomics so any task can record into a shared `Arc<CacheMetrics>`
//! without taking a lock.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::cache::LocalStats;

// == Cache Metrics ==
/// Tracks cache performance metrics.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    l1_hits: AtomicU64,
    l1_misses: AtomicU64,
    l1_latency_us: AtomicU64,
    l2_hits: AtomicU64,
    l2_misses: AtomicU64,
    l2_latency_us: AtomicU64,
    l2_errors: AtomicU64,
    evictions: AtomicU64,
    promotions: AtomicU64,
    cleanup_runs: AtomicU64,
    cleanup_expired: AtomicU64,
    last_cleanup_ms: AtomicU64,
    l1_size_gauge: AtomicUsize,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Local Tier ==
    pub fn record_l1_hit(&self, latency: Duration) {
        self.l1_hits.fetch_add(1, Ordering::Relaxed);
        self.l1_latency_us.fetch_add(micros(latency), Ordering::Relaxed);
    }

    pub fn record_l1_miss(&self, latency: Duration) {
        self.l1_misses.fetch_add(1, Ordering::Relaxed);
        self.l1_latency_us.fetch_add(micros(latency), Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Distributed Tier ==
    /// Records an L2 hit; `promoted` also counts a promotion into L1.
    pub fn record_l2_hit(&self, latency: Duration, promoted: bool) {
        self.l2_hits.fetch_add(1, Ordering::Relaxed);
        self.l2_latency_us.fetch_add(micros(latency), Ordering::Relaxed);
        if promoted {
            self.promotions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_l2_miss(&self, latency: Duration) {
        self.l2_misses.fetch_add(1, Ordering::Relaxed);
        self.l2_latency_us.fetch_add(micros(latency), Ordering::Relaxed);
    }

    pub fn record_l2_error(&self) {
        self.l2_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Maintenance ==
    /// Records one sweep: how many entries it expired and the L1 size after it.
    pub fn record_cleanup(&self, expired: usize, l1_size: usize, at_ms: u64) {
        self.cleanup_runs.fetch_add(1, Ordering::Relaxed);
        self.cleanup_expired
            .fetch_add(expired as u64, Ordering::Relaxed);
        self.last_cleanup_ms.store(at_ms, Ordering::Relaxed);
        self.l1_size_gauge.store(l1_size, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Builds a point-in-time report. Counters are read, never reset.
    pub fn snapshot(&self, local: LocalStats, l2_enabled: bool) -> MetricsSnapshot {
        let l1_hits = self.l1_hits.load(Ordering::Relaxed);
        let l1_misses = self.l1_misses.load(Ordering::Relaxed);
        let l1_latency_us = self.l1_latency_us.load(Ordering::Relaxed);
        let l2_hits = self.l2_hits.load(Ordering::Relaxed);
        let l2_misses = self.l2_misses.load(Ordering::Relaxed);
        let l2_latency_us = self.l2_latency_us.load(Ordering::Relaxed);

        // Every get consults L1 exactly once, so L1 lookups count requests
        let total_requests = l1_hits + l1_misses;
        let total_hits = l1_hits + l2_hits;
        let last_cleanup_ms = self.last_cleanup_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            overall: OverallMetrics {
                total_requests,
                total_hits,
                hit_ratio: ratio(total_hits, total_requests),
                avg_latency_ms: avg_ms(l1_latency_us + l2_latency_us, total_requests),
            },
            l1: LocalTierMetrics {
                hits: l1_hits,
                misses: l1_misses,
                hit_ratio: ratio(l1_hits, total_requests),
                avg_latency_ms: avg_ms(l1_latency_us, total_requests),
                evictions: self.evictions.load(Ordering::Relaxed),
                size: local.entries,
                max_size: local.max_size,
                utilization_percent: local.utilization_percent,
                size_bytes: local.size_bytes,
            },
            l2: DistributedTierMetrics {
                enabled: l2_enabled,
                hits: l2_hits,
                misses: l2_misses,
                hit_ratio: ratio(l2_hits, l2_hits + l2_misses),
                avg_latency_ms: avg_ms(l2_latency_us, l2_hits + l2_misses),
                promotions: self.promotions.load(Ordering::Relaxed),
                errors: self.l2_errors.load(Ordering::Relaxed),
            },
            maintenance: MaintenanceMetrics {
                runs: self.cleanup_runs.load(Ordering::Relaxed),
                expired_removed: self.cleanup_expired.load(Ordering::Relaxed),
                l1_size_at_last_run: self.l1_size_gauge.load(Ordering::Relaxed),
                last_run: (last_cleanup_ms > 0)
                    .then(|| Utc.timestamp_millis_opt(last_cleanup_ms as i64).single())
                    .flatten()
                    .map(|ts| ts.to_rfc3339()),
            },
        }
    }
}

fn micros(latency: Duration) -> u64 {
    latency.as_micros() as u64
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn avg_ms(total_us: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_us as f64 / count as f64 / 1000.0
    }
}

// == Snapshot Types ==
/// Structured metrics report returned by `TieredCache::metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub overall: OverallMetrics,
    pub l1: LocalTierMetrics,
    pub l2: DistributedTierMetrics,
    pub maintenance: MaintenanceMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallMetrics {
    pub total_requests: u64,
    pub total_hits: u64,
    /// Fraction of gets answered by either tier
    pub hit_ratio: f64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalTierMetrics {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub avg_latency_ms: f64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
    pub utilization_percent: f64,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributedTierMetrics {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub avg_latency_ms: f64,
    pub promotions: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceMetrics {
    pub runs: u64,
    pub expired_removed: u64,
    pub l1_size_at_last_run: usize,
    /// RFC 3339 timestamp of the last sweep, if any ran
    pub last_run: Option<String>,
}
