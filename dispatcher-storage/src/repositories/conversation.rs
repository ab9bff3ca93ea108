use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatcher_core::{
    ChatMessage, Conversation, ConversationContext, ConversationId, ConversationStore, CoreError,
    Result,
};
use sqlx::types::Json;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, context, number_of_received_messages, created_at, updated_at";

/// Conversations stored in a single `conversations` table with the whole
/// context held as JSONB.
#[derive(Debug, Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_conversation(row: PgRow) -> Result<Conversation> {
        let id: Uuid = row.try_get("id")?;
        let Json(context): Json<ConversationContext> = row.try_get("context")?;

        Ok(Conversation {
            id: ConversationId::from_uuid(id),
            context,
            number_of_received_messages: row.try_get("number_of_received_messages")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    async fn received_count(&self, id: &ConversationId) -> Result<Option<i32>> {
        let count = sqlx::query_scalar::<_, i32>(
            "SELECT number_of_received_messages FROM conversations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl ConversationStore for PgConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO conversations (id, context, number_of_received_messages, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(conversation.id.as_uuid())
        .bind(Json(&conversation.context))
        .bind(conversation.number_of_received_messages)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_conversation(row)
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_conversation).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM conversations
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_conversation).collect()
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_inbound(
        &self,
        id: &ConversationId,
        message: ChatMessage,
        limit: i32,
    ) -> Result<Conversation> {
        // The counter check and the append happen in one statement so two
        // concurrent partner messages cannot both slip under the limit.
        let row = sqlx::query(&format!(
            r#"
            UPDATE conversations
            SET context = jsonb_set(
                    context,
                    '{{messages}}',
                    COALESCE(context->'messages', '[]'::jsonb) || jsonb_build_array($2::jsonb)
                ),
                number_of_received_messages = number_of_received_messages + 1,
                updated_at = NOW()
            WHERE id = $1 AND number_of_received_messages < $3
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(Json(&message))
        .bind(limit)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_conversation(row),
            None => match self.received_count(id).await? {
                Some(received) => Err(CoreError::LimitReached { received, limit }),
                None => Err(CoreError::NotFound(format!("Conversation {} not found", id))),
            },
        }
    }

    async fn append_reply(
        &self,
        id: &ConversationId,
        message: ChatMessage,
    ) -> Result<Conversation> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE conversations
            SET context = jsonb_set(
                    context,
                    '{{messages}}',
                    COALESCE(context->'messages', '[]'::jsonb) || jsonb_build_array($2::jsonb)
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(Json(&message))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_conversation)
            .transpose()?
            .ok_or_else(|| CoreError::NotFound(format!("Conversation {} not found", id)))
    }
}
