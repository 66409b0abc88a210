//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is started.
//!
//! # Tasks
//! - Maintenance: sweeps expired local entries at the configured interval

mod maintenance;

pub use maintenance::{
    spawn_maintenance, spawn_maintenance_with_backoff, sweep, MaintenanceHandle, ERROR_BACKOFF,
};
