//! Live controllers, one per browser session.

use super::providers::ChatAssistant;
use super::session_store::ChatController;
use super::storage::SessionStorage;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

struct SessionEntry {
    controller: Arc<ChatController>,
    last_access: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionEntry>>,
    storage: Arc<dyn SessionStorage>,
    assistant: Arc<dyn ChatAssistant>,
    storage_key: String,
    idle_ttl: Duration,
}

impl SessionRegistry {
    /// `storage_key` is the fixed prefix; each session persists under `{storage_key}:{session_id}`.
    /// A session untouched for `idle_ttl` is over and gets evicted.
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        assistant: Arc<dyn ChatAssistant>,
        storage_key: impl Into<String>,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            storage,
            assistant,
            storage_key: storage_key.into(),
            idle_ttl,
        }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn key_for(&self, session_id: &str) -> String {
        format!("{}:{}", self.storage_key, session_id)
    }

    /// Return the live controller for `session_id`, restoring it from storage on first use.
    /// An entry found idle past the TTL is ended first, so the caller starts over.
    pub async fn get_or_load(&self, session_id: &str) -> Arc<ChatController> {
        let expired = match self.sessions.get_mut(session_id) {
            Some(mut entry) if !self.is_expired(&entry, Instant::now()) => {
                entry.last_access = Instant::now();
                return entry.controller.clone();
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.evict(session_id).await;
        }

        let controller = Arc::new(
            ChatController::load(
                self.storage.clone(),
                self.assistant.clone(),
                self.key_for(session_id),
            )
            .await,
        );

        // A concurrent request may have loaded the same session meanwhile; keep the first.
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert(SessionEntry {
                controller,
                last_access: Instant::now(),
            });
        entry.last_access = Instant::now();
        entry.controller.clone()
    }

    /// Dispose of a session: drop its controller and delete its persisted state.
    pub async fn end_session(&self, session_id: &str) -> Result<(), anyhow::Error> {
        match self.sessions.remove(session_id) {
            Some((_, entry)) => entry.controller.discard().await?,
            None => self.storage.remove(&self.key_for(session_id)).await?,
        }
        tracing::info!(session_id = %session_id, "Chat session ended");
        Ok(())
    }

    /// End every session idle for longer than the TTL. Sessions with a send in
    /// flight are kept. Returns how many were evicted.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| self.is_expired(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for session_id in idle {
            if self.evict(&session_id).await {
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted idle chat sessions");
        }
        evicted
    }

    /// Run [`Self::evict_idle`] every `period` until the handle is aborted.
    pub fn spawn_eviction(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        !entry.controller.is_loading() && now.duration_since(entry.last_access) > self.idle_ttl
    }

    /// Remove `session_id` if it is still expired, discarding its persisted state.
    async fn evict(&self, session_id: &str) -> bool {
        let now = Instant::now();
        let Some((_, entry)) = self
            .sessions
            .remove_if(session_id, |_, entry| self.is_expired(entry, now))
        else {
            return false;
        };

        if let Err(e) = entry.controller.discard().await {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to discard idle chat session");
        }
        true
    }
}
