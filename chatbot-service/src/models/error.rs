//! Failure taxonomy of the assistant pipeline.

use reqwest::StatusCode;
use serde::Serialize;
use suria_core::retry::Retryable;
use thiserror::Error;

/// Shown when a failure carries no user-facing text.
pub const FALLBACK_USER_MESSAGE: &str =
    "Lo siento, ocurrió un error al procesar tu mensaje. Por favor, inténtalo de nuevo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatErrorKind {
    /// Transport failure.
    Network,
    /// The remote service rejected or mishandled the request.
    Api,
    /// Local precondition failed.
    Validation,
    Unknown,
}

impl std::fmt::Display for ChatErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChatErrorKind::Network => "network",
            ChatErrorKind::Api => "api",
            ChatErrorKind::Validation => "validation",
            ChatErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A classified failure. `message` is diagnostic only; `user_message` is safe to show.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub user_message: Option<String>,
    pub retryable: bool,
}

impl ChatError {
    pub fn new(
        kind: ChatErrorKind,
        message: impl Into<String>,
        user_message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            user_message: Some(user_message.into()),
            retryable,
        }
    }

    pub fn missing_api_key() -> Self {
        Self::new(
            ChatErrorKind::Validation,
            "LLM API key is not configured",
            "El asistente no está configurado. Contacta al administrador del sistema.",
            false,
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(
            ChatErrorKind::Network,
            message,
            "No se pudo conectar con el asistente. Verifica tu conexión e inténtalo de nuevo.",
            true,
        )
    }

    /// Classify a non-success HTTP status returned by the chat-completion endpoint.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = format!("Chat completion API error {}: {}", status, body);
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::new(
                ChatErrorKind::Api,
                message,
                "El asistente está recibiendo demasiadas solicitudes. Espera un momento e inténtalo de nuevo.",
                true,
            ),
            StatusCode::UNAUTHORIZED => Self::new(
                ChatErrorKind::Api,
                message,
                "El asistente no está configurado correctamente. Contacta al administrador del sistema.",
                false,
            ),
            s if s.is_server_error() => Self::new(
                ChatErrorKind::Api,
                message,
                "El servicio del asistente no está disponible temporalmente. Inténtalo más tarde.",
                true,
            ),
            _ => Self::new(
                ChatErrorKind::Api,
                message,
                "No se pudo obtener una respuesta del asistente.",
                false,
            ),
        }
    }

    pub fn empty_response() -> Self {
        Self::new(
            ChatErrorKind::Api,
            "Chat completion API returned no choices",
            "El asistente no devolvió ninguna respuesta. Inténtalo de nuevo.",
            true,
        )
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(
            ChatErrorKind::Unknown,
            message,
            "Ocurrió un error inesperado. Inténtalo de nuevo.",
            true,
        )
    }

    /// Text for the synthesized assistant bubble.
    pub fn user_message_or_fallback(&self) -> &str {
        self.user_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(FALLBACK_USER_MESSAGE)
    }
}

impl Retryable for ChatError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}
