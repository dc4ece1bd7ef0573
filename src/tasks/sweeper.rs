//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries so that
//! keys nobody reads again do not linger until the next write.
//!
//! Each tick takes the cache lock, pops expired entries off the expiration
//! heap and releases the lock before sleeping again. Lazy sweeping inside the
//! cache operations is what guarantees correctness; the sweeper only bounds
//! how long cold expired entries hold memory.

use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::store::CacheStore;
use crate::cache::LruTtlCache;
use crate::clock::Clock;
use crate::error::{CacheError, Result};

// == Sweeper Handle ==
/// Controls a running expiry sweeper.
///
/// Cancellation is cooperative: a sweep already in progress completes, and
/// no new tick starts once cancellation is observed.
///
/// Dropping the handle detaches the task; it keeps sweeping until every
/// handle to the cache is gone. Use [`cancel`](Self::cancel) or
/// [`shutdown`](Self::shutdown) to stop it earlier.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// A handle with no task behind it, returned when sweeping is disabled.
    fn inert() -> Self {
        Self {
            shutdown_tx: None,
            task: None,
        }
    }

    /// Returns true if a background task was started for this handle.
    pub fn is_enabled(&self) -> bool {
        self.task.is_some()
    }

    /// Returns true once the background task has exited (or never existed).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signals the sweeper to stop.
    pub fn cancel(&self) {
        if let Some(tx) = &self.shutdown_tx {
            // The receiver is gone if the task already exited.
            let _ = tx.send(true);
        }
    }

    /// Cancels the sweeper and waits for its task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Spawns a background task that periodically sweeps expired entries from `cache`.
///
/// A zero `interval` disables the sweeper and returns an inert handle.
/// Otherwise the task is spawned on the current tokio runtime; calling this
/// outside a runtime fails with `NoRuntime`.
///
/// # Example
/// ```ignore
/// let cache = LruTtlCache::new(1000)?;
/// let sweeper = spawn_sweeper(&cache, Duration::from_secs(1))?;
/// // Later, during shutdown:
/// sweeper.shutdown().await;
/// ```
pub fn spawn_sweeper<K, V>(cache: &LruTtlCache<K, V>, interval: Duration) -> Result<SweeperHandle>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    if interval.is_zero() {
        debug!("Expiry sweeper disabled (zero interval)");
        return Ok(SweeperHandle::inert());
    }

    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = runtime.spawn(sweeper_loop(
        cache.downgrade(),
        cache.clock(),
        interval,
        shutdown_rx,
    ));

    Ok(SweeperHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

/// The main sweeper loop.
async fn sweeper_loop<K, V>(
    store: Weak<Mutex<CacheStore<K, V>>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    K: Eq + Hash + Clone,
{
    info!(
        "Starting expiry sweeper with interval of {} ms",
        interval.as_millis()
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    break;
                }
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }

        let Some(strong) = store.upgrade() else {
            debug!("Cache dropped, expiry sweeper exiting");
            break;
        };

        // The guard is released before the next sleep.
        let (removed, remaining) = {
            let mut guard = strong.lock();
            let removed = guard.purge_expired(clock.now());
            (removed, guard.len())
        };
        drop(strong);

        if removed > 0 {
            info!(
                "Expiry sweep: removed {} expired entries, {} remaining",
                removed, remaining
            );
        } else {
            debug!("Expiry sweep: no expired entries found");
        }
    }

    info!("Expiry sweeper stopped");
}
