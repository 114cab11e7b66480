//! Per-session conversation controller.
//!
//! Owns `{is_open, messages}` plus the transient loading flag, calls the
//! assistant, and writes the state through to [`SessionStorage`] after every
//! mutation.

use super::context::build_context;
use super::providers::ChatAssistant;
use super::storage::SessionStorage;
use crate::models::{ChatContext, ChatErrorKind, Message, Role, SessionState};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Route assumed before the first navigation event.
pub const DEFAULT_ROUTE: &str = "/";

/// Result of [`ChatController::send_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "errorType")]
pub enum SendOutcome {
    /// Input was empty or whitespace only; nothing changed.
    Ignored,
    /// Another send is in flight; nothing changed.
    Busy,
    /// The assistant replied.
    Answered,
    /// The assistant failed; an apology message was appended instead.
    Failed(ChatErrorKind),
}

/// What the widget renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_open: bool,
}

impl ChatSnapshot {
    /// Drops system-role messages, which are never shown in the widget.
    pub fn visible(mut self) -> Self {
        self.messages.retain(|m| m.role != Role::System);
        self
    }
}

pub struct ChatController {
    storage: Arc<dyn SessionStorage>,
    assistant: Arc<dyn ChatAssistant>,
    storage_key: String,
    state: Mutex<SessionState>,
    loading: AtomicBool,
    disposed: AtomicBool,
    route: RwLock<String>,
}

/// Clears the loading flag when dropped, whatever way the send ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ChatController {
    /// Construct and restore persisted state. Missing, malformed or unreadable
    /// state falls back to a closed widget with an empty history.
    pub async fn load(
        storage: Arc<dyn SessionStorage>,
        assistant: Arc<dyn ChatAssistant>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let state = match storage.get(&storage_key).await {
            Ok(Some(raw)) => SessionState::from_json(&raw).unwrap_or_else(|e| {
                tracing::warn!(key = %storage_key, error = %e, "Discarding malformed chat state");
                SessionState::default()
            }),
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "Failed to load chat state");
                SessionState::default()
            }
        };

        tracing::debug!(
            key = %storage_key,
            message_count = state.messages.len(),
            is_open = state.is_open,
            "Chat session loaded"
        );

        Self {
            storage,
            assistant,
            storage_key,
            state: Mutex::new(state),
            loading: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            route: RwLock::new(DEFAULT_ROUTE.to_string()),
        }
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.is_open
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.lock().await;
        ChatSnapshot {
            messages: state.messages.clone(),
            is_loading: self.is_loading(),
            is_open: state.is_open,
        }
    }

    /// Record a navigation event.
    pub fn navigate(&self, path: &str) {
        let mut route = self.route.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *route = path.to_string();
    }

    pub fn current_route(&self) -> String {
        self.route
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get_context(&self) -> ChatContext {
        build_context(&self.current_route())
    }

    pub async fn toggle_open(&self) -> bool {
        let mut state = self.state.lock().await;
        state.is_open = !state.is_open;
        self.persist(&state).await;
        state.is_open
    }

    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        state.messages.clear();
        self.persist(&state).await;
        tracing::info!(key = %self.storage_key, "Chat history cleared");
    }

    /// Send user input to the assistant and record the reply (or an apology).
    pub async fn send_message(&self, content: &str) -> SendOutcome {
        let Some(user_message) = Message::user(content) else {
            return SendOutcome::Ignored;
        };

        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(key = %self.storage_key, "Send rejected: another message is in flight");
            return SendOutcome::Busy;
        }
        let _loading = LoadingGuard(&self.loading);

        let history = {
            let mut state = self.state.lock().await;
            state.push(user_message);
            self.persist(&state).await;
            state.messages.clone()
        };

        let context = self.get_context();
        tracing::info!(
            key = %self.storage_key,
            route = %context.current_route,
            history_len = history.len(),
            "Sending message to assistant"
        );

        let (reply, outcome) = match self.assistant.send_message(&history, &context).await {
            Ok(text) => (Message::assistant(text), SendOutcome::Answered),
            Err(err) => {
                tracing::warn!(
                    key = %self.storage_key,
                    error_type = %err.kind,
                    retryable = err.retryable,
                    error = %err.message,
                    "Assistant request failed"
                );
                (
                    Message::assistant(err.user_message_or_fallback()),
                    SendOutcome::Failed(err.kind),
                )
            }
        };

        let mut state = self.state.lock().await;
        state.push(reply);
        self.persist(&state).await;

        outcome
    }

    /// Remove the persisted state for this session. Later mutations, including
    /// a send already in flight, stay in memory and are never written back.
    pub async fn discard(&self) -> Result<(), anyhow::Error> {
        // Every persist runs under the state lock, so none can land after the delete.
        let _state = self.state.lock().await;
        self.disposed.store(true, Ordering::SeqCst);
        self.storage.remove(&self.storage_key).await
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Write-through of the current state. Storage failures are logged, never surfaced.
    async fn persist(&self, state: &SessionState) {
        if self.is_disposed() {
            tracing::debug!(key = %self.storage_key, "Skipping persist for disposed session");
            return;
        }

        let raw = match state.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key = %self.storage_key, error = %e, "Failed to serialize chat state");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.storage_key, &raw).await {
            tracing::warn!(key = %self.storage_key, error = %e, "Failed to persist chat state");
        }
    }
}
