//! Periodic sweep of expired memory cache entries.
//!
//! Lazy expiry only removes entries that are read again. `CacheJanitor`
//! purges everything past its TTL on a fixed interval so write-once entries
//! do not accumulate.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::memory::cache::BoundedTtlCache;

/// Shortest period a janitor will sweep at.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct CacheJanitor {
    cache: Arc<BoundedTtlCache>,
    interval: Duration,
}

impl CacheJanitor {
    /// A zero `interval` is raised to one second.
    pub fn new(cache: Arc<BoundedTtlCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Run one sweep. Returns the number of expired entries removed.
    pub fn sweep(&self) -> usize {
        let removed = self.cache.purge_expired();
        if removed > 0 {
            tracing::info!(removed, remaining = self.cache.len(), "Purged expired memory cache entries");
        } else {
            tracing::debug!("Memory cache sweep found nothing to purge");
        }
        removed
    }

    /// Sweep every `interval` until `shutdown` is cancelled.
    ///
    /// The first sweep happens one full interval after spawning.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Memory cache janitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.sweep();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);
    const INTERVAL: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired() {
        let cache = Arc::new(BoundedTtlCache::new(TTL, 10));
        cache.set("u1_7", &["사용자: old".to_string()]);
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        cache.set("u2_7", &["사용자: new".to_string()]);

        let janitor = CacheJanitor::new(Arc::clone(&cache), INTERVAL);
        assert_eq!(janitor.sweep(), 1);
        assert_eq!(janitor.sweep(), 0);
        assert!(cache.has("u2_7"));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_janitor_purges_unread_entries() {
        let cache = Arc::new(BoundedTtlCache::new(TTL, 10));
        cache.set("u1_7", &["사용자: never read again".to_string()]);

        let shutdown = CancellationToken::new();
        let handle = CacheJanitor::new(Arc::clone(&cache), INTERVAL).spawn(shutdown.clone());

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(cache.len(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised_and_janitor_keeps_running() {
        let cache = Arc::new(BoundedTtlCache::new(Duration::from_millis(10), 10));
        cache.set("u1_7", &["사용자: short lived".to_string()]);

        let shutdown = CancellationToken::new();
        let handle = CacheJanitor::new(Arc::clone(&cache), Duration::ZERO).spawn(shutdown.clone());

        tokio::time::sleep(MIN_INTERVAL + Duration::from_millis(500)).await;
        assert_eq!(cache.len(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn janitor_does_not_sweep_before_first_interval() {
        let cache = Arc::new(BoundedTtlCache::new(Duration::from_secs(1), 10));
        cache.set("u1_7", &["사용자: entry".to_string()]);

        let shutdown = CancellationToken::new();
        let handle = CacheJanitor::new(Arc::clone(&cache), INTERVAL).spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cache.len(), 1, "expired but not yet swept");

        shutdown.cancel();
        handle.await.unwrap();
    }
}
