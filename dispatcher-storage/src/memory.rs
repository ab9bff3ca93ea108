//! In-process conversation store.
//!
//! Used when no database is configured and by tests. Every mutation runs
//! under the map's shard lock for the conversation, so the limit check and
//! the append in [`ConversationStore::record_inbound`] cannot interleave.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use dispatcher_core::{
    ChatMessage, Conversation, ConversationId, ConversationStore, CoreError, Result,
};

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<ConversationId, Conversation>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

fn not_found(id: &ConversationId) -> CoreError {
    CoreError::NotFound(format!("Conversation {} not found", id))
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation> {
        match self.conversations.entry(conversation.id) {
            Entry::Occupied(_) => Err(CoreError::Validation(format!(
                "Conversation {} already exists",
                conversation.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(conversation.clone());
                Ok(conversation.clone())
            }
        }
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(id).map(|entry| entry.value().clone()))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Conversation>> {
        let mut all: Vec<Conversation> = self
            .conversations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool> {
        Ok(self.conversations.remove(id).is_some())
    }

    async fn record_inbound(
        &self,
        id: &ConversationId,
        message: ChatMessage,
        limit: i32,
    ) -> Result<Conversation> {
        let mut entry = self.conversations.get_mut(id).ok_or_else(|| not_found(id))?;
        let conversation = entry.value_mut();

        if !conversation.accepts_inbound(limit) {
            return Err(CoreError::LimitReached {
                received: conversation.number_of_received_messages,
                limit,
            });
        }

        conversation.context.messages.push(message);
        conversation.number_of_received_messages += 1;
        conversation.updated_at = Utc::now();

        Ok(conversation.clone())
    }

    async fn append_reply(
        &self,
        id: &ConversationId,
        message: ChatMessage,
    ) -> Result<Conversation> {
        let mut entry = self.conversations.get_mut(id).ok_or_else(|| not_found(id))?;
        let conversation = entry.value_mut();

        conversation.context.messages.push(message);
        conversation.updated_at = Utc::now();

        Ok(conversation.clone())
    }
}
