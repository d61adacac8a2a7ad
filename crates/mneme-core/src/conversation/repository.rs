//! ConversationRepository trait definition.
//!
//! The conversation store is an external collaborator; memory extraction
//! only needs a bounded, newest-first window of one user's history.

use chrono::{DateTime, Utc};
use mneme_types::conversation::ConversationRecord;
use mneme_types::error::RepositoryError;

/// Read-only port to the conversation store.
///
/// Implementations live in mneme-infra (e.g., `InMemoryConversationStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ConversationRepository: Send + Sync {
    /// Conversations for `user_id` created at or after `since`, ordered
    /// by `created_at` DESC and capped to `limit` records.
    fn recent_conversations(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationRecord>, RepositoryError>> + Send;
}
