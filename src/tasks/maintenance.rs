//! Maintenance Task
//!
//! Background task that periodically sweeps expired entries out of the
//! local tier and records the run in the shared metrics.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheMetrics, LocalCache};

/// Pause after a failed sweep before trying again.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Handle to a running maintenance task.
#[derive(Debug)]
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MaintenanceHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the task to stop and waits up to `grace` for it to exit.
    ///
    /// A task still running after the grace period is aborted. Returns
    /// whether it exited on its own.
    pub async fn stop(mut self, grace: Duration) -> bool {
        let _ = self.shutdown.send(true);

        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(_) => {
                info!("Maintenance task stopped");
                true
            }
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "Maintenance task did not stop in time, aborting");
                self.handle.abort();
                false
            }
        }
    }
}

/// Runs one sweep: removes expired local entries and records the run.
///
/// Returns the number of entries removed.
pub fn sweep(local: &LocalCache, metrics: &CacheMetrics) -> usize {
    let expired = local.cleanup_expired();
    metrics.record_cleanup(expired, local.len(), current_timestamp_ms());
    expired
}

/// Spawns the periodic maintenance task.
///
/// The task sleeps for `interval`, sweeps on the blocking pool, and repeats
/// until the returned handle is stopped. A sweep that panics is logged and
/// followed by `ERROR_BACKOFF` before the next attempt.
pub fn spawn_maintenance(
    local: Arc<LocalCache>,
    metrics: Arc<CacheMetrics>,
    interval: Duration,
) -> MaintenanceHandle {
    spawn_maintenance_with_backoff(local, metrics, interval, ERROR_BACKOFF)
}

/// Like `spawn_maintenance` with a custom pause after a failed sweep.
pub fn spawn_maintenance_with_backoff(
    local: Arc<LocalCache>,
    metrics: Arc<CacheMetrics>,
    interval: Duration,
    backoff: Duration,
) -> MaintenanceHandle {
    spawn_sweeper(move || sweep(&local, &metrics), interval, backoff)
}

fn spawn_sweeper<F>(sweep_fn: F, interval: Duration, backoff: Duration) -> MaintenanceHandle
where
    F: Fn() -> usize + Send + Sync + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let sweep_fn = Arc::new(sweep_fn);

    let handle = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting cache maintenance task");

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let run = sweep_fn.clone();
            match tokio::task::spawn_blocking(move || run()).await {
                Ok(0) => debug!("Maintenance sweep: no expired entries found"),
                Ok(removed) => info!(removed, "Maintenance sweep removed expired entries"),
                Err(e) => {
                    error!(error = %e, backoff_ms = backoff.as_millis() as u64, "Maintenance sweep failed, backing off");
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        debug!("Cache maintenance task exiting");
    });

    MaintenanceHandle { shutdown, handle }
}
