//! Memory service: the entry point used by prompt assembly.
//!
//! Owns one cache instance, the extractor built on it, and the janitor
//! settings, all derived from a single `MemoryConfig`.

use std::sync::Arc;
use std::time::Duration;

use mneme_types::config::MemoryConfig;
use mneme_types::memory::{CacheStats, PriorityWeights};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::conversation::repository::ConversationRepository;
use crate::memory::cache::BoundedTtlCache;
use crate::memory::extractor::{ExtractionLimits, MemoryExtractor};
use crate::memory::janitor::CacheJanitor;
use crate::memory::ranker::MemoryRanker;

/// Dependency-injected memory service.
///
/// Generic over `R: ConversationRepository` so callers pick the storage
/// backend at construction time.
pub struct MemoryService<R> {
    extractor: MemoryExtractor<R>,
    cleanup_interval: Duration,
}

impl<R: ConversationRepository> MemoryService<R> {
    pub fn new(config: &MemoryConfig, repository: Arc<R>) -> Self {
        let cache = Arc::new(BoundedTtlCache::new(config.cache_ttl(), config.cache_max_size));
        tracing::debug!(
            ttl_minutes = config.cache_ttl_minutes,
            max_size = config.cache_max_size,
            "Memory cache created"
        );
        Self {
            extractor: MemoryExtractor::new(repository, cache, ExtractionLimits::from(config)),
            cleanup_interval: config.cleanup_interval(),
        }
    }

    pub fn extractor(&self) -> &MemoryExtractor<R> {
        &self.extractor
    }

    /// Recent memories in extraction order.
    pub async fn recent_memories(&self, user_id: &str, retention_days: u32) -> Vec<String> {
        self.extractor.recent_memories(user_id, retention_days).await
    }

    /// Recent memories reordered by the caller's category weights.
    pub async fn prioritized_memories(
        &self,
        user_id: &str,
        retention_days: u32,
        weights: &PriorityWeights,
    ) -> Vec<String> {
        let memories = self.recent_memories(user_id, retention_days).await;
        MemoryRanker::prioritize(&memories, weights)
    }

    /// Drop every cached window for `user_id`, e.g. after new messages are stored.
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        self.extractor.cache().invalidate_user(user_id)
    }

    pub fn clear(&self) {
        self.extractor.cache().clear();
        tracing::info!("Memory cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.extractor.cache().stats()
    }

    /// Start the periodic expiry sweep; it runs until `shutdown` is cancelled.
    pub fn spawn_janitor(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        CacheJanitor::new(Arc::clone(self.extractor.cache()), self.cleanup_interval).spawn(shutdown)
    }
}
