//! Completion service client
//!
//! Speaks the Anthropic Messages API (`POST /v1/messages`). One call to
//! [`CompletionService::complete`] is one HTTP attempt.

use crate::client::HttpClient;
use crate::config::{AuthConfig, SdkConfig};
use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;
use dispatcher_core::ChatMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const MESSAGES_PATH: &str = "/v1/messages";

/// Default value for the `anthropic-version` header
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Generative-text service the dispatcher talks to.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the conversation and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> SdkResult<CompletionResponse>;
}

/// A single completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Optional system prompt
    pub system: Option<String>,
    /// Conversation so far, oldest first, ending with a user message
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// A one-shot request with a single user message
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            system: None,
            messages: vec![ChatMessage::user(text)],
        }
    }

    /// A request that continues an existing conversation
    pub fn conversation(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        let system = system.into();
        Self {
            system: (!system.is_empty()).then_some(system),
            messages,
        }
    }
}

/// The generated answer
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Concatenated text of every text block in the answer
    pub text: String,
    /// Model that produced the answer
    pub model: String,
    /// Why generation stopped, when reported
    pub stop_reason: Option<String>,
    /// Tokens generated, when reported
    pub output_tokens: Option<u32>,
}

/// Generation settings that stay fixed for the lifetime of the client
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    /// Model identifier
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    output_tokens: Option<u32>,
}

/// Client for the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Arc<HttpClient>,
    settings: CompletionSettings,
}

impl AnthropicClient {
    /// Create a new completion client.
    ///
    /// The [`HttpClient`] should be built from [`AnthropicClient::sdk_config`].
    pub fn new(client: Arc<HttpClient>, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    /// HTTP configuration for the Messages API: API key auth plus the
    /// `anthropic-version` header
    pub fn sdk_config(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_version: &str,
    ) -> SdkConfig {
        SdkConfig::new(base_url)
            .with_auth(AuthConfig::ApiKey(api_key.into()))
            .with_header("anthropic-version", api_version)
    }

    /// Generation settings in use
    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> SdkResult<CompletionResponse> {
        if request.messages.is_empty() {
            return Err(SdkError::InvalidRequest(
                "a completion needs at least one message".to_string(),
            ));
        }

        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
        };

        let response: MessagesResponse = self.client.post(MESSAGES_PATH, body).await?;

        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        if text.is_empty() {
            return Err(SdkError::UnexpectedResponse(
                "completion contained no text blocks".to_string(),
            ));
        }

        debug!(
            model = %response.model,
            chars = text.len(),
            "Completion received"
        );

        Ok(CompletionResponse {
            text,
            model: response.model,
            stop_reason: response.stop_reason,
            output_tokens: response.usage.and_then(|u| u.output_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sdk_config_carries_key_and_version() {
        let config = AnthropicClient::sdk_config("https://api.anthropic.com", "key", DEFAULT_API_VERSION);

        assert!(matches!(config.auth, AuthConfig::ApiKey(ref k) if k == "key"));
        assert_eq!(
            config.custom_headers,
            vec![("anthropic-version".to_string(), DEFAULT_API_VERSION.to_string())]
        );
    }

    #[test]
    fn test_request_body_omits_empty_system() {
        let messages = vec![ChatMessage::user("hello")];
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            temperature: 0.0,
            system: None,
            messages: &messages,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("system").is_none());
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_conversation_request_drops_blank_system_prompt() {
        let request = CompletionRequest::conversation("", vec![ChatMessage::user("hi")]);
        assert_eq!(request.system, None);

        let request = CompletionRequest::conversation("negotiate", vec![]);
        assert_eq!(request.system.as_deref(), Some("negotiate"));
    }

    #[test]
    fn test_response_ignores_non_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "model": "claude",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                {"type": "text", "text": " world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }))
        .unwrap();

        assert_eq!(response.content.len(), 3);
        assert!(matches!(response.content[1], ContentBlock::Other));
    }
}
