use async_trait::async_trait;

use crate::domain::{ChatMessage, Conversation, ConversationId};
use crate::error::Result;

/// Persistence boundary for negotiations.
///
/// Mutations are expressed as whole read-modify-write operations so every
/// implementation can apply them atomically; callers never load a record,
/// change it and write it back themselves.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation>;

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>>;

    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Conversation>>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &ConversationId) -> Result<bool>;

    /// Appends an inbound partner message and bumps the received counter.
    ///
    /// Fails with [`CoreError::LimitReached`](crate::CoreError::LimitReached)
    /// when `limit` messages were already received, and with
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) for unknown ids.
    async fn record_inbound(
        &self,
        id: &ConversationId,
        message: ChatMessage,
        limit: i32,
    ) -> Result<Conversation>;

    /// Appends an outbound (assistant) message without touching the counter.
    async fn append_reply(&self, id: &ConversationId, message: ChatMessage)
        -> Result<Conversation>;
}
