//! Chat-completion client for OpenAI-compatible endpoints.
//!
//! Builds the system prompt, posts `{model, messages, temperature, max_tokens}`
//! with a bearer credential, classifies the outcome and retries transient failures.

use super::ChatAssistant;
use crate::models::{ChatContext, ChatError, Message};
use crate::services::prompt::build_system_prompt;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use suria_core::error::AppError;
use suria_core::retry::{retry_with_backoff, RetryConfig};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration. Everything but the key has a default.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub api_key: Option<Secret<String>>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

impl LlmClientConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(Secret::new(api_key.into())),
            ..Default::default()
        }
    }
}

/// Stateless apart from its configuration; safe to share across sessions.
pub struct LlmClient {
    config: LlmClientConfig,
    client: Client,
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// The outbound body: system prompt first, then `history` in order.
    pub fn build_request(&self, history: &[Message], context: &ChatContext) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(RequestMessage {
            role: "system".to_string(),
            content: build_system_prompt(context),
        });
        messages.extend(history.iter().map(|message| RequestMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }));

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// One HTTP call, classified.
    async fn attempt(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    ChatError::network(e.to_string())
                } else {
                    ChatError::unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatError::from_status(status, &error_text));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::unknown(format!("Failed to parse response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(ChatError::empty_response)
    }
}

#[async_trait]
impl ChatAssistant for LlmClient {
    async fn send_message(
        &self,
        history: &[Message],
        context: &ChatContext,
    ) -> Result<String, ChatError> {
        let api_key = match &self.config.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => key.expose_secret(),
            _ => return Err(ChatError::missing_api_key()),
        };

        let request = self.build_request(history, context);

        tracing::debug!(
            model = %self.config.model,
            route = %context.current_route,
            message_count = request.messages.len(),
            "Sending request to chat completion API"
        );

        let request = &request;
        let reply = retry_with_backoff(&self.config.retry, "chat_completion", move || {
            self.attempt(api_key, request)
        })
        .await?;

        tracing::debug!(reply_len = reply.len(), "Received chat completion");
        Ok(reply)
    }
}

// ============================================================================
// Chat Completion API Request/Response Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::context::build_context;

    fn client() -> LlmClient {
        LlmClient::new(LlmClientConfig::with_api_key("test-key")).unwrap()
    }

    #[test]
    fn defaults_are_sane() {
        let config = LlmClientConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn request_starts_with_system_prompt_and_keeps_history_order() {
        let history = vec![
            Message::user("hola").unwrap(),
            Message::assistant("¡Hola! ¿En qué te ayudo?"),
            Message::new(Role::System, "nota interna"),
            Message::user("¿Qué es UPME?").unwrap(),
        ];
        let context = build_context("/upme/gas-natural");

        let request = client().build_request(&history, &context);

        assert_eq!(request.messages.len(), history.len() + 1);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("/upme/gas-natural"));
        for (sent, original) in request.messages[1..].iter().zip(&history) {
            assert_eq!(sent.role, original.role.as_str());
            assert_eq!(sent.content, original.content);
        }
    }

    #[test]
    fn request_body_uses_wire_field_names() {
        let request = client().build_request(&[], &build_context("/"));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(body["temperature"].is_number());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_call() {
        let client = LlmClient::new(LlmClientConfig {
            api_url: "http://127.0.0.1:1/unreachable".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = client
            .send_message(&[Message::user("hola").unwrap()], &build_context("/"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, crate::models::ChatErrorKind::Validation);
        assert!(!err.retryable);
    }

    #[test]
    fn response_without_choices_parses_empty() {
        let parsed: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
