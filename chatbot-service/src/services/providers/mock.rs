//! Scripted assistant for tests and offline development.

use super::ChatAssistant;
use crate::models::{ChatContext, ChatError, Message, Role};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued results in order; once the queue is empty it echoes the last
/// user message.
#[derive(Default)]
pub struct MockAssistant {
    script: Mutex<VecDeque<Result<String, ChatError>>>,
    calls: AtomicUsize,
    last_history: Mutex<Option<Vec<Message>>>,
    last_context: Mutex<Option<ChatContext>>,
    delay: Option<Duration>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `responses` in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for response in responses {
            mock.push_response(Ok(response.into()));
        }
        mock
    }

    /// Fail the next call with `error`.
    pub fn failing_with(error: ChatError) -> Self {
        let mock = Self::new();
        mock.push_response(Err(error));
        mock
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, response: Result<String, ChatError>) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_history(&self) -> Option<Vec<Message>> {
        self.last_history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_context(&self) -> Option<ChatContext> {
        self.last_context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatAssistant for MockAssistant {
    async fn send_message(
        &self,
        history: &[Message],
        context: &ChatContext,
    ) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(history.to_vec());
        *self
            .last_context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(context.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        scripted.unwrap_or_else(|| {
            let prompt = history
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            Ok(format!("Respuesta simulada para: {}", prompt))
        })
    }
}
