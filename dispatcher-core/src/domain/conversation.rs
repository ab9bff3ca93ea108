use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, DispatchProposal, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Background fact for the bot, stored as something it already said.
    pub fn knowledge(knowledge: &str) -> Self {
        Self::assistant(format!(
            "I will remember the following information: {}",
            knowledge
        ))
    }
}

/// Everything the negotiation needs to resume: the system prompt, the message
/// history and the dispatch decision that opened it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Label shown in listings; see [`Conversation::display_name`]
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub proposal: Option<DispatchProposal>,
    #[serde(default)]
    pub route: Option<Route>,
}

/// A persisted negotiation with one partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub context: ConversationContext,
    pub number_of_received_messages: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(context: ConversationContext) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            context,
            number_of_received_messages: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether another inbound message fits under `limit`.
    pub fn accepts_inbound(&self, limit: i32) -> bool {
        self.number_of_received_messages < limit
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.context.messages.last()
    }

    /// The context's name, or `Context-` and the first eight hex digits of the id.
    pub fn display_name(&self) -> String {
        match &self.context.name {
            Some(name) => name.clone(),
            None => {
                let id = self.id.to_string();
                format!("Context-{}", &id[..8])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_conversation_starts_empty() {
        let conversation = Conversation::new(ConversationContext::default());

        assert_eq!(conversation.number_of_received_messages, 0);
        assert!(conversation.accepts_inbound(5));
        assert!(conversation.last_message().is_none());
    }

    #[test]
    fn test_accepts_inbound_stops_at_limit() {
        let mut conversation = Conversation::new(ConversationContext::default());
        conversation.number_of_received_messages = 5;

        assert!(!conversation.accepts_inbound(5));
        assert!(conversation.accepts_inbound(6));
    }

    #[test]
    fn test_context_tolerates_missing_fields() {
        let context: ConversationContext = serde_json::from_value(json!({})).unwrap();
        assert_eq!(context, ConversationContext::default());
    }

    #[test]
    fn test_display_name_falls_back_to_id_prefix() {
        let mut conversation = Conversation::new(ConversationContext::default());
        let id = conversation.id.to_string();

        assert_eq!(conversation.display_name(), format!("Context-{}", &id[..8]));

        conversation.context.name = Some("Belgrade run".to_string());
        assert_eq!(conversation.display_name(), "Belgrade run");
    }

    #[test]
    fn test_knowledge_is_an_assistant_message() {
        let message = ChatMessage::knowledge("Partner 4 only drives refrigerated trucks");

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(
            message.content,
            "I will remember the following information: Partner 4 only drives refrigerated trucks"
        );
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, json!({"role": "assistant", "content": "hi"}));
    }
}
