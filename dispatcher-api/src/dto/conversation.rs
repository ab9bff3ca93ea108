use chrono::{DateTime, Utc};
use dispatcher_core::{ChatMessage, Conversation, DispatchProposal, Route};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddKnowledgeRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub reply: String,
    pub number_of_received_messages: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub name: String,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub proposal: Option<DispatchProposal>,
    pub route: Option<Route>,
    pub number_of_received_messages: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            name: conversation.display_name(),
            id: conversation.id.into(),
            system_prompt: conversation.context.system_prompt,
            messages: conversation.context.messages,
            proposal: conversation.context.proposal,
            route: conversation.context.route,
            number_of_received_messages: conversation.number_of_received_messages,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}
