//! Background purge of expired cache entries
//!
//! Expiry is normally lazy: a stale entry is only dropped when its key is looked
//! up again. Under high key cardinality that leaves dead entries around, so a
//! sweeper task can purge them on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::SingleFlightCache;

/// Handle for controlling a running sweeper
///
/// The task stops on [`SweeperHandle::shutdown`], when the handle is dropped,
/// or once every handle to the cache has been dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Stops the sweeper task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl<V, E> SingleFlightCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Spawns a task that calls `purge_expired` every `interval`
    ///
    /// Must be called from within a tokio runtime. The task holds only a weak
    /// reference to the cache.
    ///
    /// # Returns
    /// * `Some(SweeperHandle)` for the running task
    /// * `None` if `interval` is zero; no task is spawned
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<SweeperHandle> {
        if interval.is_zero() {
            warn!("sweep interval is zero, not starting sweeper");
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let inner = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first tick (immediate)
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(inner) = inner.upgrade() else {
                            debug!("cache dropped, stopping sweeper");
                            break;
                        };
                        let purged = inner.lock().purge_expired(Instant::now());
                        if purged > 0 {
                            debug!(purged, "purged expired cache entries");
                        }
                    }
                }
            }
        });

        Some(SweeperHandle { shutdown_tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::error::ApiError;

    type TestCache = SingleFlightCache<u32, ApiError>;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_entries() {
        let cache = TestCache::new();
        let key = CacheKey::from("k");
        cache
            .get_or_fetch(&key, Duration::from_secs(1), || async { Ok(1) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        let _handle = cache.spawn_sweeper(Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_keeps_fresh_entries() {
        let cache = TestCache::new();
        let key = CacheKey::from("k");
        cache
            .get_or_fetch(&key, Duration::from_secs(60), || async { Ok(1) })
            .await
            .unwrap();

        let _handle = cache.spawn_sweeper(Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_sweeping() {
        let cache = TestCache::new();
        let key = CacheKey::from("k");

        let handle = cache.spawn_sweeper(Duration::from_secs(5)).unwrap();
        handle.shutdown().await;

        cache
            .get_or_fetch(&key, Duration::from_secs(1), || async { Ok(1) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        // Still present: only a lookup or manual purge would drop it now
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_starts_no_sweeper() {
        let cache = TestCache::new();
        let key = CacheKey::from("k");
        assert!(cache.spawn_sweeper(Duration::ZERO).is_none());

        cache
            .get_or_fetch(&key, Duration::from_secs(1), || async { Ok(1) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
    }
}
