//! Chat widget endpoints. Every request names its browser session in the
//! `x-chat-session` header.

use crate::models::ChatContext;
use crate::services::{ChatController, ChatSnapshot, SendOutcome};
use crate::startup::AppState;
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use suria_core::error::AppError;
use validator::Validate;

pub const SESSION_HEADER: &str = "x-chat-session";

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 4000, message = "Message is too long"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NavigateRequest {
    #[validate(length(min = 1, message = "Path cannot be empty"))]
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(flatten)]
    pub outcome: SendOutcome,
    pub state: ChatSnapshot,
}

fn session_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Missing or invalid {} header", SESSION_HEADER))
        })
}

async fn controller(state: &AppState, headers: &HeaderMap) -> Result<Arc<ChatController>, AppError> {
    let session_id = session_id(headers)?;
    Ok(state.registry.get_or_load(&session_id).await)
}

#[tracing::instrument(skip(state, headers))]
pub async fn get_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChatSnapshot>, AppError> {
    let controller = controller(&state, &headers).await?;
    Ok(Json(controller.snapshot().await.visible()))
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    request.validate()?;
    let controller = controller(&state, &headers).await?;

    // Detached so a dropped connection does not cancel an in-flight send.
    let task_controller = controller.clone();
    let outcome = tokio::spawn(async move { task_controller.send_message(&request.content).await })
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Send task failed: {}", e)))?;

    if outcome == SendOutcome::Busy {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "A message is already being processed for this session"
        )));
    }

    Ok(Json(SendMessageResponse {
        outcome,
        state: controller.snapshot().await.visible(),
    }))
}

#[tracing::instrument(skip(state, headers))]
pub async fn clear_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChatSnapshot>, AppError> {
    let controller = controller(&state, &headers).await?;
    controller.clear_history().await;
    Ok(Json(controller.snapshot().await.visible()))
}

#[tracing::instrument(skip(state, headers))]
pub async fn toggle_open(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChatSnapshot>, AppError> {
    let controller = controller(&state, &headers).await?;
    controller.toggle_open().await;
    Ok(Json(controller.snapshot().await.visible()))
}

#[tracing::instrument(skip(state, headers))]
pub async fn get_context(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChatContext>, AppError> {
    let controller = controller(&state, &headers).await?;
    Ok(Json(controller.get_context()))
}

#[tracing::instrument(skip(state, headers))]
pub async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<ChatContext>, AppError> {
    request.validate()?;
    let controller = controller(&state, &headers).await?;
    controller.navigate(&request.path);
    Ok(Json(controller.get_context()))
}

#[tracing::instrument(skip(state, headers))]
pub async fn end_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let session_id = session_id(&headers)?;
    state
        .registry
        .end_session(&session_id)
        .await
        .map_err(AppError::StorageError)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_header_is_required() {
        let headers = HeaderMap::new();
        assert!(session_id(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("   "));
        assert!(session_id(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static(" tab-1 "));
        assert_eq!(session_id(&headers).unwrap(), "tab-1");
    }

    #[test]
    fn long_messages_fail_validation() {
        let request = SendMessageRequest {
            content: "a".repeat(4001),
        };
        assert!(request.validate().is_err());

        let request = SendMessageRequest {
            content: "   ".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
