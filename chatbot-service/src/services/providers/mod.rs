//! Assistant backends.
//!
//! The session controller only sees the [`ChatAssistant`] trait, so the HTTP
//! client and the scripted mock are interchangeable.

pub mod mock;
pub mod openai;

use crate::models::{ChatContext, ChatError, Message};
use async_trait::async_trait;

pub use mock::MockAssistant;
pub use openai::{LlmClient, LlmClientConfig};

/// Turns a conversation and its context into assistant text, or a classified failure.
#[async_trait]
pub trait ChatAssistant: Send + Sync {
    /// `history` is sent in order after the system prompt built from `context`.
    async fn send_message(
        &self,
        history: &[Message],
        context: &ChatContext,
    ) -> Result<String, ChatError>;
}
