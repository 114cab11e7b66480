//! Application startup and lifecycle management.

use crate::config::{ChatbotConfig, LlmProvider, StorageBackend};
use crate::handlers::{chat, health};
use crate::services::{
    ChatAssistant, LlmClient, MemorySessionStorage, MockAssistant, RedisSessionStorage,
    SessionRegistry, SessionStorage,
};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use suria_core::error::AppError;
use suria_core::middleware::request_id_middleware;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// How often idle chat sessions are swept.
const EVICTION_PERIOD: Duration = Duration::from_secs(60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatbotConfig,
    pub registry: SessionRegistry,
}

/// Build the widget-facing router over `state`.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/api/chat/state", get(chat::get_state))
        .route(
            "/api/chat/messages",
            post(chat::send_message).delete(chat::clear_history),
        )
        .route("/api/chat/toggle", post(chat::toggle_open))
        .route("/api/chat/context", get(chat::get_context))
        .route("/api/chat/route", put(chat::navigate))
        .route("/api/chat/session", delete(chat::end_session))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn build_storage(config: &ChatbotConfig) -> Result<Arc<dyn SessionStorage>, AppError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory session storage");
            Ok(Arc::new(MemorySessionStorage::new()))
        }
        StorageBackend::Redis => {
            let url = config.storage.redis_url.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("REDIS_URL is required for redis storage"))
            })?;
            let storage =
                RedisSessionStorage::new(url.expose_secret(), config.storage.session_ttl_secs)
                    .await
                    .map_err(AppError::StorageError)?;
            Ok(Arc::new(storage))
        }
    }
}

fn build_assistant(config: &ChatbotConfig) -> Result<Arc<dyn ChatAssistant>, AppError> {
    match config.llm.provider {
        LlmProvider::OpenAi => {
            let client = LlmClient::new(config.llm.client_config())?;
            tracing::info!(
                model = %config.llm.model,
                api_url = %config.llm.api_url,
                "Initialized chat completion client"
            );
            Ok(Arc::new(client))
        }
        LlmProvider::Mock => {
            tracing::warn!("Using mock assistant; replies are simulated");
            Ok(Arc::new(MockAssistant::new()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ChatbotConfig) -> Result<Self, AppError> {
        let storage = build_storage(&config).await?;
        let assistant = build_assistant(&config)?;
        let registry = SessionRegistry::new(
            storage,
            assistant,
            config.storage.storage_key.clone(),
            Duration::from_secs(config.storage.session_ttl_secs),
        );

        let state = AppState {
            config: config.clone(),
            registry,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Chatbot service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the shutdown future resolves.
    pub async fn run_until_stopped(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let eviction = self.state.registry.spawn_eviction(EVICTION_PERIOD);
        let router = app_router(self.state);
        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            });
        eviction.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, StorageConfig, DEFAULT_STORAGE_KEY};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AppState {
        let config = ChatbotConfig {
            common: suria_core::config::Config { port: 0 },
            llm: LlmConfig {
                provider: LlmProvider::Mock,
                api_key: None,
                api_url: String::new(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.7,
                max_tokens: 1000,
                timeout_secs: 5,
                max_retries: 0,
                initial_backoff_ms: 1,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                redis_url: None,
                session_ttl_secs: 60,
                storage_key: DEFAULT_STORAGE_KEY.to_string(),
            },
        };
        let registry = SessionRegistry::new(
            Arc::new(MemorySessionStorage::new()),
            Arc::new(MockAssistant::new()),
            DEFAULT_STORAGE_KEY,
            Duration::from_secs(60),
        );
        AppState { config, registry }
    }

    #[tokio::test]
    async fn chat_routes_require_session_header() {
        let response = app_router(state())
            .oneshot(
                Request::builder()
                    .uri("/api/chat/state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn state_route_creates_session() {
        let state = state();
        let response = app_router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/chat/state")
                    .header("x-chat-session", "tab-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.registry.active_sessions(), 1);
    }
}
