//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from a store,
//! independent of lookup traffic.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::SharedClock;

/// A store whose expired entries can be dropped in one pass.
pub trait Sweep: Send + 'static {
    /// Removes every entry expired at `now_ms` and returns how many went.
    fn sweep_expired(&mut self, now_ms: u64) -> usize;
}

/// Spawns a background task that sweeps `store` every `interval`.
///
/// The lock is held only for the synchronous sweep itself, never across the
/// sleep. The returned handle is owned by the component that started the task
/// and aborted when that component is destroyed or dropped.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(state.clone(), clock.clone(), Duration::from_secs(300), "credential cache");
/// // Later, during teardown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<S: Sweep>(
    store: Arc<Mutex<S>>,
    clock: SharedClock,
    interval: Duration,
    label: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting {} sweep task with interval of {}ms",
            label,
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.lock().sweep_expired(clock.now_ms());

            if removed > 0 {
                info!("{} sweep: removed {} expired entries", label, removed);
            } else {
                debug!("{} sweep: no expired entries found", label);
            }
        }
    })
}
