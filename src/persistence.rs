//! Conversation persistence collaborator.
//!
//! The pipeline calls these hooks around query handling but owns none of the
//! storage semantics; durable backends live outside this crate. The in-memory
//! implementation backs tests and demos.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RagError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A persisted conversation message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub content: String,
}

/// Storage hooks invoked around query handling.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), RagError>;

    /// The most recent `limit` messages for a user, oldest first.
    async fn recent_messages(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, RagError>;

    /// Removes every message for a user.
    async fn clear_conversation(&self, user_id: &str) -> Result<(), RagError>;
}

/// Process-local store; suitable for tests and single-process demos only.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    messages: Mutex<Vec<StoredMessage>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), RagError> {
        self.messages.lock().push(StoredMessage {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, RagError> {
        let messages = self.messages.lock();
        let mut matching: Vec<StoredMessage> = messages
            .iter()
            .filter(|message| message.user_id == user_id)
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.split_off(skip))
    }

    async fn clear_conversation(&self, user_id: &str) -> Result<(), RagError> {
        self.messages
            .lock()
            .retain(|message| message.user_id != user_id);
        Ok(())
    }
}
