//! Recent-memory extraction from stored conversation history.
//!
//! `MemoryExtractor` answers "recent memories for user U within R days". A
//! fresh cache entry for `"{U}_{R}"` is returned as-is; otherwise a bounded,
//! newest-first window of conversations is fetched, chunked, validated,
//! sanitized, and capped, and the result is cached before it is returned.
//!
//! Extraction is best-effort: a failed fetch logs an error and yields an
//! empty list so the surrounding conversation flow is never blocked.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use mneme_types::config::MemoryConfig;
use mneme_types::conversation::{ConversationRecord, MessageRole};
use serde_json::Value;

use crate::conversation::repository::ConversationRepository;
use crate::memory::cache::{BoundedTtlCache, cache_key};
use crate::memory::sanitizer::{is_valid_message, sanitize_content};

/// Messages considered from the tail of each chunk.
const MESSAGES_PER_CHUNK: usize = 5;

/// Bounds applied to one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub max_memories: usize,
    pub max_conversations: usize,
    pub chunk_size: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for ExtractionLimits {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            max_memories: config.max_memories_per_user,
            max_conversations: config.max_conversations_per_query,
            chunk_size: config.chunk_size,
        }
    }
}

/// Collect up to `max_memories` memory strings from `conversations`.
///
/// Conversations are visited in the given order (newest first). Each message
/// list is split into `chunk_size` chunks in original order, and the last
/// five messages of every chunk are visited most-recent first. Scanning stops
/// the moment the cap is reached.
pub fn extract_memories(
    conversations: &[ConversationRecord],
    max_memories: usize,
    chunk_size: usize,
) -> Vec<String> {
    let mut memories = Vec::new();
    if max_memories == 0 {
        return memories;
    }

    for conversation in conversations {
        let Some(messages) = conversation.message_list() else {
            tracing::debug!(
                conversation_id = %conversation.id,
                "Skipping conversation without a message list"
            );
            continue;
        };

        for chunk in messages.chunks(chunk_size.max(1)) {
            let tail = &chunk[chunk.len().saturating_sub(MESSAGES_PER_CHUNK)..];
            for message in tail.iter().rev() {
                let Some(memory) = memory_from_message(message) else {
                    continue;
                };
                memories.push(memory);
                if memories.len() >= max_memories {
                    return memories;
                }
            }
        }
    }

    memories
}

/// Render one raw message as `"{prefix}: {content}"`, or `None` to skip it.
fn memory_from_message(message: &Value) -> Option<String> {
    if !is_valid_message(message) {
        return None;
    }
    let role: MessageRole = message.get("role")?.as_str()?.parse().ok()?;
    let content = sanitize_content(message.get("content")?.as_str()?);
    if content.is_empty() {
        return None;
    }
    Some(format!("{}: {content}", role.memory_prefix()))
}

type GateMap = DashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Removes a per-key gate from the map once no caller holds it.
///
/// Runs on drop, so the entry is also cleaned up when the owning future is
/// cancelled mid-fetch. Must be declared before the gate it covers so the
/// gate is released first.
struct InFlightCleanup<'a> {
    map: &'a GateMap,
    key: &'a str,
}

impl Drop for InFlightCleanup<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(self.key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

/// Cached, bounded memory extraction over a conversation repository.
///
/// Concurrent misses for the same key are serialized: the first caller scans
/// history while later callers wait and then read its cached result.
pub struct MemoryExtractor<R> {
    repository: Arc<R>,
    cache: Arc<BoundedTtlCache>,
    limits: ExtractionLimits,
    in_flight: GateMap,
}

impl<R: ConversationRepository> MemoryExtractor<R> {
    pub fn new(repository: Arc<R>, cache: Arc<BoundedTtlCache>, limits: ExtractionLimits) -> Self {
        Self {
            repository,
            cache,
            limits,
            in_flight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<BoundedTtlCache> {
        &self.cache
    }

    pub fn limits(&self) -> ExtractionLimits {
        self.limits
    }

    /// [`extract_memories`] with this extractor's chunk size.
    pub fn extract_memories(
        &self,
        conversations: &[ConversationRecord],
        max_memories: usize,
    ) -> Vec<String> {
        extract_memories(conversations, max_memories, self.limits.chunk_size)
    }

    /// Recent memories for `user_id` over the last `retention_days` days.
    ///
    /// Never fails: fetch errors are logged and produce an empty list, which
    /// is not cached so the next call retries.
    #[tracing::instrument(name = "recent_memories", skip(self), fields(user_id = %user_id))]
    pub async fn recent_memories(&self, user_id: &str, retention_days: u32) -> Vec<String> {
        let key = cache_key(user_id, retention_days);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(memory_count = cached.len(), "Memory cache hit");
            return cached;
        }

        let _cleanup = InFlightCleanup {
            map: &self.in_flight,
            key: &key,
        };
        let gate = self.in_flight.entry(key.clone()).or_default().clone();
        self.load_exclusive(user_id, retention_days, &key, &gate).await
    }

    async fn load_exclusive(
        &self,
        user_id: &str,
        retention_days: u32,
        key: &str,
        gate: &tokio::sync::Mutex<()>,
    ) -> Vec<String> {
        let _guard = match gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let guard = gate.lock().await;
                if let Some(cached) = self.cache.get(key) {
                    tracing::debug!(
                        memory_count = cached.len(),
                        "Memory cache filled by concurrent extraction"
                    );
                    return cached;
                }
                guard
            }
        };

        self.scan_and_store(user_id, retention_days, key).await
    }

    async fn scan_and_store(&self, user_id: &str, retention_days: u32, key: &str) -> Vec<String> {
        let started = Instant::now();
        let since = retention_cutoff(Utc::now(), retention_days);

        let conversations = match self
            .repository
            .recent_conversations(user_id, since, self.limits.max_conversations)
            .await
        {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch conversation history; returning no memories");
                return Vec::new();
            }
        };

        let window = &conversations[..conversations.len().min(self.limits.max_conversations)];
        let memories = self.extract_memories(window, self.limits.max_memories);
        self.cache.set(key, &memories);

        tracing::info!(
            conversation_count = window.len(),
            memory_count = memories.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extracted recent memories"
        );
        memories
    }
}

/// Oldest `created_at` eligible for a `retention_days` window ending at `now`.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(retention_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
