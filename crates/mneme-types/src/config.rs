//! Memory subsystem configuration.
//!
//! `MemoryConfig` can be deserialized from a `memory.toml` file and then
//! overlaid with environment-style integers. Every field has a default, and
//! an unusable override (absent, non-numeric, or zero) leaves the current
//! value in place.

use serde::{Deserialize, Serialize};

use std::time::Duration;

pub const ENV_CACHE_TTL_MINUTES: &str = "MEMORY_CACHE_TTL_MINUTES";
pub const ENV_CACHE_MAX_SIZE: &str = "MEMORY_CACHE_MAX_SIZE";
pub const ENV_MAX_MEMORIES_PER_USER: &str = "MAX_MEMORIES_PER_USER";
pub const ENV_MAX_CONVERSATIONS_PER_QUERY: &str = "MAX_CONVERSATIONS_PER_QUERY";
pub const ENV_CHUNK_SIZE: &str = "MEMORY_CHUNK_SIZE";
pub const ENV_CLEANUP_INTERVAL_MINUTES: &str = "MEMORY_CLEANUP_INTERVAL_MINUTES";

/// Tunables for the memory cache, extractor, and janitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Minutes a cached memory list stays fresh.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    /// Maximum number of cached (user, retention window) entries.
    #[serde(default = "default_cache_max_size")]
    pub cache_max_size: usize,

    /// Upper bound on memories returned per extraction.
    #[serde(default = "default_max_memories_per_user")]
    pub max_memories_per_user: usize,

    /// Upper bound on conversations fetched per extraction.
    #[serde(default = "default_max_conversations_per_query")]
    pub max_conversations_per_query: usize,

    /// Number of messages per processing chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Minutes between janitor sweeps.
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,
}

fn default_cache_ttl_minutes() -> u64 {
    5
}

fn default_cache_max_size() -> usize {
    100
}

fn default_max_memories_per_user() -> usize {
    20
}

fn default_max_conversations_per_query() -> usize {
    10
}

fn default_chunk_size() -> usize {
    5
}

fn default_cleanup_interval_minutes() -> u64 {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
            cache_max_size: default_cache_max_size(),
            max_memories_per_user: default_max_memories_per_user(),
            max_conversations_per_query: default_max_conversations_per_query(),
            chunk_size: default_chunk_size(),
            cleanup_interval_minutes: default_cleanup_interval_minutes(),
        }
    }
}

impl MemoryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    /// Sweep period; a zero from any source is raised to one minute.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_minutes.max(1).saturating_mul(60))
    }

    /// Overlay environment-style values read through `lookup`.
    ///
    /// Returns the updated config together with the names of the variables
    /// that were present but unusable, so the caller can log them.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> (Self, Vec<&'static str>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        let mut read = |name: &'static str| -> Option<u64> {
            let raw = lookup(name)?;
            let parsed = parse_positive(&raw);
            if parsed.is_none() {
                rejected.push(name);
            }
            parsed
        };

        if let Some(v) = read(ENV_CACHE_TTL_MINUTES) {
            self.cache_ttl_minutes = v;
        }
        if let Some(v) = read(ENV_CACHE_MAX_SIZE) {
            self.cache_max_size = v as usize;
        }
        if let Some(v) = read(ENV_MAX_MEMORIES_PER_USER) {
            self.max_memories_per_user = v as usize;
        }
        if let Some(v) = read(ENV_MAX_CONVERSATIONS_PER_QUERY) {
            self.max_conversations_per_query = v as usize;
        }
        if let Some(v) = read(ENV_CHUNK_SIZE) {
            self.chunk_size = v as usize;
        }
        if let Some(v) = read(ENV_CLEANUP_INTERVAL_MINUTES) {
            self.cleanup_interval_minutes = v;
        }

        (self, rejected)
    }
}

/// Parse a strictly positive integer, tolerating surrounding whitespace.
fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v > 0)
}
