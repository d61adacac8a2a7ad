//! Conversation types supplied by the external conversation store.
//!
//! Records are read-only inputs to memory extraction. Their `messages` field
//! is kept as raw JSON because the store makes no shape guarantees: a record
//! with a missing or non-array `messages` value is skipped, and each message
//! is validated individually before use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role of a message author within a stored conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Prefix placed in front of a memory derived from a message of this role.
    pub fn memory_prefix(&self) -> &'static str {
        match self {
            MessageRole::User => "사용자",
            MessageRole::Assistant => "AI",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    /// Role names are matched exactly; `"User"` or `"system"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A stored conversation as returned by the conversation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Raw message list. Expected to be an array of `{role, content, ...}`
    /// objects, but stored as-is so malformed records can be skipped.
    #[serde(default)]
    pub messages: serde_json::Value,
}

impl ConversationRecord {
    /// The message array, or `None` when `messages` is missing or not an array.
    pub fn message_list(&self) -> Option<&[serde_json::Value]> {
        self.messages.as_array().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_message_role_rejects_unknown() {
        assert!("system".parse::<MessageRole>().is_err());
        assert!("User".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_memory_prefix() {
        assert_eq!(MessageRole::User.memory_prefix(), "사용자");
        assert_eq!(MessageRole::Assistant.memory_prefix(), "AI");
    }

    #[test]
    fn test_record_without_messages_deserializes() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "id": Uuid::now_v7(),
            "user_id": "u1",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(record.message_list().is_none());
    }

    #[test]
    fn test_record_with_non_array_messages() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "id": Uuid::now_v7(),
            "user_id": "u1",
            "created_at": "2026-01-01T00:00:00Z",
            "messages": "not a list"
        }))
        .unwrap();
        assert!(record.message_list().is_none());
    }

    #[test]
    fn test_record_message_list() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "id": Uuid::now_v7(),
            "user_id": "u1",
            "created_at": "2026-01-01T00:00:00Z",
            "messages": [{"role": "user", "content": "hello there friend"}]
        }))
        .unwrap();
        assert_eq!(record.message_list().map(<[_]>::len), Some(1));
    }
}
