//! Memory configuration loader.
//!
//! Reads `memory.toml` from the data directory and deserializes it into
//! [`MemoryConfig`], then overlays environment variables. Falls back to
//! defaults when the file is missing or malformed; unusable environment
//! values are ignored.

use std::path::Path;

use mneme_types::config::MemoryConfig;

const CONFIG_FILE: &str = "memory.toml";

/// Load `{data_dir}/memory.toml` and apply process environment overrides.
pub async fn load_memory_config(data_dir: &Path) -> MemoryConfig {
    let file_config = load_file_config(data_dir).await;
    apply_env_overrides(file_config, |key| std::env::var(key).ok())
}

/// Load `{data_dir}/memory.toml` without looking at the environment.
///
/// - Missing file: [`MemoryConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_file_config(data_dir: &Path) -> MemoryConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
    };

    match toml::from_str::<MemoryConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            MemoryConfig::default()
        }
    }
}

/// Overlay environment-style values from `lookup` onto `config`.
pub fn apply_env_overrides<F>(config: MemoryConfig, lookup: F) -> MemoryConfig
where
    F: Fn(&str) -> Option<String>,
{
    let (config, rejected) = config.with_env_overrides(lookup);
    for name in rejected {
        tracing::debug!(variable = name, "Ignoring non-numeric or zero memory setting");
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use mneme_types::config::{ENV_CACHE_MAX_SIZE, ENV_CACHE_TTL_MINUTES};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_file_config(tmp.path()).await;
        assert_eq!(config, MemoryConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            "cache_ttl_minutes = 15\nmax_memories_per_user = 8\n",
        )
        .await
        .unwrap();

        let config = load_file_config(tmp.path()).await;
        assert_eq!(config.cache_ttl_minutes, 15);
        assert_eq!(config.max_memories_per_user, 8);
        assert_eq!(config.cache_max_size, 100);
    }

    #[tokio::test]
    async fn malformed_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "cache_ttl_minutes = \"soon\"")
            .await
            .unwrap();

        let config = load_file_config(tmp.path()).await;
        assert_eq!(config, MemoryConfig::default());
    }

    #[tokio::test]
    async fn env_overrides_take_precedence_over_file() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "cache_max_size = 50\ncache_ttl_minutes = 2")
            .await
            .unwrap();

        let file_config = load_file_config(tmp.path()).await;
        let config = apply_env_overrides(file_config, |key| match key {
            k if k == ENV_CACHE_MAX_SIZE => Some("75".to_string()),
            k if k == ENV_CACHE_TTL_MINUTES => Some("not-a-number".to_string()),
            _ => None,
        });

        assert_eq!(config.cache_max_size, 75);
        assert_eq!(config.cache_ttl_minutes, 2);
    }
}
