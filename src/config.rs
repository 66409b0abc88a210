//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults,
/// so the service is usable with zero configuration (L2 disabled, L1 only).
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL for the distributed tier; `None` disables L2
    pub redis_url: Option<String>,
    /// Maximum number of simultaneous Redis connections
    pub redis_max_connections: usize,
    /// Pool wait/create/recycle timeout in milliseconds
    pub redis_timeout_ms: u64,
    /// Maximum number of entries the local tier can hold
    pub l1_max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub l1_default_ttl: u64,
    /// Background maintenance interval in seconds
    pub cleanup_interval: u64,
    /// How long `stop()` waits for the maintenance task before aborting it
    pub shutdown_grace_ms: u64,
    /// Write the read-updated entry back to L2 every Nth read once promoted
    pub l2_writeback_every: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Distributed tier URL (default: unset, L2 disabled)
    /// - `REDIS_MAX_CONNECTIONS` - Pool size (default: 50)
    /// - `REDIS_TIMEOUT_MS` - Pool timeouts (default: 2000)
    /// - `L1_MAX_ENTRIES` - Local tier capacity (default: 10000)
    /// - `L1_DEFAULT_TTL` - Default TTL in seconds (default: 1800)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `SHUTDOWN_GRACE_MS` - Maintenance stop timeout (default: 5000)
    /// - `L2_WRITEBACK_EVERY` - L2 write-back period after promotion (default: 1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            redis_max_connections: env_or("REDIS_MAX_CONNECTIONS", defaults.redis_max_connections),
            redis_timeout_ms: env_or("REDIS_TIMEOUT_MS", defaults.redis_timeout_ms),
            l1_max_entries: env_or("L1_MAX_ENTRIES", defaults.l1_max_entries),
            l1_default_ttl: env_or("L1_DEFAULT_TTL", defaults.l1_default_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval).max(1),
            shutdown_grace_ms: env_or("SHUTDOWN_GRACE_MS", defaults.shutdown_grace_ms),
            l2_writeback_every: env_or("L2_WRITEBACK_EVERY", defaults.l2_writeback_every).max(1),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.l1_default_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_max_connections: 50,
            redis_timeout_ms: 2000,
            l1_max_entries: 10_000,
            l1_default_ttl: 1800,
            cleanup_interval: 300,
            shutdown_grace_ms: 5000,
            l2_writeback_every: 1,
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
