//! Bounded, TTL-expiring cache for extracted memory lists.
//!
//! `BoundedTtlCache` maps a `"{user_id}_{retention_days}"` key to the memory
//! list extracted for it. Entries expire `ttl` after they were stored and the
//! table never holds more than `max_size` entries: inserting a new key into a
//! full table first evicts the oldest-inserted key (insertion order, not
//! access order -- reads never refresh an entry's position).
//!
//! Expiry runs on two paths that share [`is_expired`]: lazily on
//! `get`/`has`, and eagerly through [`BoundedTtlCache::purge_expired`],
//! which the janitor calls on a timer.
//!
//! The table sits behind a single `Mutex` so evict-then-insert and the full
//! sweep are atomic with respect to every other operation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mneme_types::memory::CacheStats;
use tokio::time::Instant;

/// Build the cache key for a user's memories over a retention window.
pub fn cache_key(user_id: &str, retention_days: u32) -> String {
    format!("{user_id}_{retention_days}")
}

/// Key prefix shared by every retention window of `user_id`.
pub fn user_prefix(user_id: &str) -> String {
    format!("{user_id}_")
}

/// Whether an entry stored at `stored_at` is stale at `now`.
///
/// An entry is still fresh at exactly `stored_at + ttl`.
pub fn is_expired(stored_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(stored_at) > ttl
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<String>,
    stored_at: Instant,
}

impl CacheEntry {
    fn approx_bytes(&self) -> usize {
        self.data.iter().map(String::len).sum()
    }
}

#[derive(Debug, Default)]
struct CacheTable {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; front is the next eviction candidate.
    order: VecDeque<String>,
}

impl CacheTable {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
    }

    fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str, &CacheEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|k, v| keep(k, v));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }
}

/// Process-local memory cache with a size bound and per-entry TTL.
///
/// Construct one instance and share it behind an `Arc`; tests build isolated
/// instances instead of relying on a global.
#[derive(Debug)]
pub struct BoundedTtlCache {
    table: Mutex<CacheTable>,
    ttl: Duration,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BoundedTtlCache {
    /// Create a cache. A `max_size` of zero is raised to one.
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            table: Mutex::new(CacheTable::default()),
            ttl,
            max_size: max_size.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheTable> {
        self.table.lock().expect("memory cache lock poisoned")
    }

    /// Fetch a copy of the fresh data stored under `key`.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let mut table = self.lock();
        let now = Instant::now();

        let found = match table.entries.get(key) {
            Some(entry) if !is_expired(entry.stored_at, now, self.ttl) => Some(entry.data.clone()),
            Some(_) => {
                table.remove(key);
                tracing::debug!(cache_key = key, "Dropped expired memory cache entry on read");
                None
            }
            None => None,
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a copy of `data` under `key` with a fresh timestamp.
    ///
    /// Overwriting moves the key to the back of the eviction order. When a
    /// new key would exceed the bound, the oldest-inserted key is evicted
    /// before the insert.
    pub fn set(&self, key: impl Into<String>, data: &[String]) {
        let key = key.into();
        let mut table = self.lock();

        if !table.remove(&key) && table.entries.len() >= self.max_size {
            if let Some(oldest) = table.order.pop_front() {
                table.entries.remove(&oldest);
                tracing::debug!(evicted = %oldest, "Evicted oldest memory cache entry");
            }
        }

        table.entries.insert(
            key.clone(),
            CacheEntry {
                data: data.to_vec(),
                stored_at: Instant::now(),
            },
        );
        table.order.push_back(key);
    }

    /// Whether a fresh entry exists for `key`. Removes it if expired.
    pub fn has(&self, key: &str) -> bool {
        let mut table = self.lock();
        let now = Instant::now();
        match table.entries.get(key) {
            Some(entry) if !is_expired(entry.stored_at, now, self.ttl) => true,
            Some(_) => {
                table.remove(key);
                false
            }
            None => false,
        }
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Remove every entry belonging to `user_id`. Returns the number removed.
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        let prefix = user_prefix(user_id);
        let removed = self.lock().retain(|key, _| !key.starts_with(&prefix));
        if removed > 0 {
            tracing::info!(user_id, removed, "Invalidated user memory cache entries");
        }
        removed
    }

    /// Remove every entry whose age exceeds the TTL. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        self.lock()
            .retain(|_, entry| !is_expired(entry.stored_at, now, ttl))
    }

    pub fn clear(&self) {
        let mut table = self.lock();
        table.entries.clear();
        table.order.clear();
    }

    /// Stored entry count, including expired entries not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let table = self.lock();
        let approx_memory_bytes = table
            .entries
            .iter()
            .map(|(key, entry)| key.len() + entry.approx_bytes())
            .sum();
        CacheStats {
            size: table.entries.len(),
            max_size: self.max_size,
            ttl_ms: self.ttl.as_millis() as u64,
            approx_memory_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(300);

    fn data(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cache_key_format() {
        assert_eq!(cache_key("u1", 7), "u1_7");
        assert_eq!(user_prefix("u1"), "u1_");
    }

    #[tokio::test]
    async fn set_then_get_returns_copy() {
        let cache = BoundedTtlCache::new(TTL, 10);
        let mut original = data(&["사용자: hello"]);
        cache.set("u1_7", &original);
        original.push("mutated".to_string());

        assert_eq!(cache.get("u1_7"), Some(data(&["사용자: hello"])));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let cache = BoundedTtlCache::new(TTL, 10);
        assert_eq!(cache.get("nobody_7"), None);
        assert!(!cache.has("nobody_7"));
        assert!(!cache.delete("nobody_7"));
    }

    #[tokio::test]
    async fn empty_list_is_a_hit() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("u1_7", &[]);
        assert_eq!(cache.get("u1_7"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn evicts_oldest_inserted_when_full() {
        let cache = BoundedTtlCache::new(TTL, 2);
        cache.set("a", &data(&["1"]));
        cache.set("b", &data(&["2"]));
        cache.set("c", &data(&["3"]));

        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn reads_do_not_refresh_eviction_order() {
        let cache = BoundedTtlCache::new(TTL, 2);
        cache.set("a", &data(&["1"]));
        cache.set("b", &data(&["2"]));
        assert!(cache.get("a").is_some());
        cache.set("c", &data(&["3"]));

        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[tokio::test]
    async fn reinsert_moves_key_to_back() {
        let cache = BoundedTtlCache::new(TTL, 2);
        cache.set("a", &data(&["1"]));
        cache.set("b", &data(&["2"]));
        cache.set("a", &data(&["1b"]));
        cache.set("c", &data(&["3"]));

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
        assert_eq!(cache.get("a"), Some(data(&["1b"])));
    }

    #[tokio::test]
    async fn overwrite_does_not_evict() {
        let cache = BoundedTtlCache::new(TTL, 2);
        cache.set("a", &data(&["1"]));
        cache.set("b", &data(&["2"]));
        cache.set("b", &data(&["2b"]));
        assert!(cache.has("a"));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn size_never_exceeds_bound() {
        let cache = BoundedTtlCache::new(TTL, 5);
        for i in 0..200 {
            cache.set(format!("user{}_{}", i % 13, i % 3), &data(&["m"]));
            assert!(cache.len() <= 5);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entry_fresh_until_ttl_then_expires() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("u1_7", &data(&["x"]));

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("u1_7"), Some(data(&["x"])));

        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(cache.get("u1_7"), None);
        assert_eq!(cache.len(), 0, "expired entry removed on read");
    }

    #[tokio::test(start_paused = true)]
    async fn has_removes_expired_entry() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("u1_7", &data(&["x"]));
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert_eq!(cache.len(), 1);
        assert!(!cache.has("u1_7"));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_removes_only_stale_entries() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("old_7", &data(&["x"]));
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.set("new_7", &data(&["y"]));
        tokio::time::advance(Duration::from_secs(150)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.has("new_7"));
        assert!(!cache.has("old_7"));
    }

    #[tokio::test]
    async fn invalidate_user_removes_only_that_users_keys() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("u1_7", &data(&["a"]));
        cache.set("u1_30", &data(&["b"]));
        cache.set("u2_7", &data(&["c"]));

        assert_eq!(cache.invalidate_user("u1"), 2);
        assert!(!cache.has("u1_7"));
        assert!(!cache.has("u1_30"));
        assert!(cache.has("u2_7"));
        assert_eq!(cache.invalidate_user("u1"), 0);
    }

    #[tokio::test]
    async fn invalidated_keys_leave_eviction_order() {
        let cache = BoundedTtlCache::new(TTL, 2);
        cache.set("u1_7", &data(&["a"]));
        cache.set("u2_7", &data(&["b"]));
        cache.invalidate_user("u1");
        cache.set("u3_7", &data(&["c"]));

        assert!(cache.has("u2_7"));
        assert!(cache.has("u3_7"));
    }

    #[tokio::test]
    async fn clear_and_delete() {
        let cache = BoundedTtlCache::new(TTL, 10);
        cache.set("a", &data(&["1"]));
        cache.set("b", &data(&["2"]));
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn stats_report_size_and_counters() {
        let cache = BoundedTtlCache::new(TTL, 3);
        cache.set("ab", &data(&["xyz", "q"]));
        let _ = cache.get("ab");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 3);
        assert_eq!(stats.ttl_ms, 300_000);
        assert_eq!(stats.approx_memory_bytes, 2 + 3 + 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn zero_max_size_is_raised_to_one() {
        let cache = BoundedTtlCache::new(TTL, 0);
        assert_eq!(cache.max_size(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sets_respect_bound() {
        let cache = Arc::new(BoundedTtlCache::new(TTL, 8));
        let mut handles = Vec::new();

        for i in 0..64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set(format!("u{i}_7"), &[format!("memory {i}")]);
                let _ = cache.get(&format!("u{i}_7"));
                cache.purge_expired();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 8);
    }
}
