//! In-process conversation store.
//!
//! `InMemoryConversationStore` keeps conversation records in a `RwLock`ed
//! vector and answers the newest-first window query used by memory
//! extraction. It can be seeded from a JSON array of records on disk.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use mneme_core::conversation::repository::ConversationRepository;
use mneme_types::conversation::ConversationRecord;
use mneme_types::error::RepositoryError;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised while seeding the store from a file.
#[derive(Debug, Error)]
pub enum StoreLoadError {
    #[error("failed to read conversation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse conversation file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    records: RwLock<Vec<ConversationRecord>>,
    offline: AtomicBool,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ConversationRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            offline: AtomicBool::new(false),
        }
    }

    /// Build a store from a JSON file holding an array of conversation records.
    pub async fn load_json(path: &Path) -> Result<Self, StoreLoadError> {
        let content = tokio::fs::read_to_string(path).await?;
        let records: Vec<ConversationRecord> = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            record_count = records.len(),
            "Loaded conversation records"
        );
        Ok(Self::with_records(records))
    }

    pub async fn insert(&self, record: ConversationRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Simulate an outage: while offline every query fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl ConversationRepository for InMemoryConversationStore {
    async fn recent_conversations(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }

        let records = self.records.read().await;
        let mut matching: Vec<ConversationRecord> = records
            .iter()
            .filter(|record| record.user_id == user_id && record.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
