//! Tiered Cache - a two-level cache service
//!
//! A bounded in-process LRU (L1) in front of an optional Redis tier (L2),
//! with promotion of hot L2 keys, per-tier metrics, a background expiry
//! sweep and function memoization.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::TieredCache;
pub use config::Config;
pub use error::{CacheError, Result};
