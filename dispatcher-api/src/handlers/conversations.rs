use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dispatcher_core::{ChatMessage, ConversationId};
use dispatcher_sdk::CompletionRequest;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    prompt::negotiation_history,
    AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<PaginatedResponse<ConversationResponse>>> {
    pagination.validate()?;

    let limit = pagination.limit();
    let offset = pagination.offset();

    // One extra row tells whether another page exists
    let mut conversations = state.conversations.list(limit + 1, offset).await?;
    let has_more = conversations.len() as i64 > limit;
    conversations.truncate(limit as usize);

    Ok(Json(PaginatedResponse {
        data: conversations.into_iter().map(Into::into).collect(),
        limit,
        offset,
        has_more,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation = state
        .conversations
        .get(&ConversationId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Conversation {} not found", id)))?;

    Ok(Json(conversation.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.conversations.delete(&ConversationId::from_uuid(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Conversation {} not found", id)))
    }
}

/// Adds background knowledge to a negotiation without counting it as a
/// received message.
pub async fn add_knowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddKnowledgeRequest>,
) -> ApiResult<Json<ConversationResponse>> {
    payload.validate()?;
    let id = ConversationId::from_uuid(id);

    let conversation = state
        .conversations
        .append_reply(&id, ChatMessage::knowledge(&payload.content))
        .await?;

    info!(conversation_id = %id, "Knowledge added");
    Ok(Json(conversation.into()))
}

/// Records a partner's message and answers it.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    payload.validate()?;
    let id = ConversationId::from_uuid(id);

    let conversation = state
        .conversations
        .record_inbound(&id, ChatMessage::user(payload.content), state.max_received_messages)
        .await?;

    let request = CompletionRequest::conversation(
        conversation.context.system_prompt.clone(),
        negotiation_history(&conversation.context.messages),
    );
    let completion = state
        .executor
        .execute_with_cancellation(|| state.completion.complete(&request), &state.shutdown)
        .await?;

    let updated = state
        .conversations
        .append_reply(&id, ChatMessage::assistant(completion.text.clone()))
        .await?;

    info!(
        conversation_id = %id,
        received = updated.number_of_received_messages,
        limit = state.max_received_messages,
        "Partner message answered"
    );

    Ok(Json(SendMessageResponse {
        reply: completion.text,
        number_of_received_messages: updated.number_of_received_messages,
    }))
}
