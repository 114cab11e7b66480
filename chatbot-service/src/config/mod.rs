use secrecy::Secret;
use std::env;
use std::time::Duration;
use suria_core::config as core_config;
use suria_core::error::AppError;
use suria_core::retry::RetryConfig;

use crate::services::providers::openai::{
    DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use crate::services::LlmClientConfig;

/// Fixed prefix of the persisted chat state key.
pub const DEFAULT_STORAGE_KEY: &str = "suria-chatbot-state";

/// Redis TTL; a session idle longer than this starts over.
const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub common: core_config::Config,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Mock,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<Secret<String>>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: Option<Secret<String>>,
    pub session_ttl_secs: u64,
    pub storage_key: String,
}

impl ChatbotConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider = match get_env("LLM_PROVIDER", Some("openai"), is_prod)?.as_str() {
            "openai" => LlmProvider::OpenAi,
            "mock" if !is_prod => LlmProvider::Mock,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Unsupported LLM_PROVIDER '{}'",
                    other
                )))
            }
        };

        let backend = match get_env("SESSION_STORAGE", Some("memory"), is_prod)?.as_str() {
            "memory" => StorageBackend::Memory,
            "redis" => StorageBackend::Redis,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Unsupported SESSION_STORAGE '{}'",
                    other
                )))
            }
        };

        // A missing key is reported to the user at send time, not at startup.
        let api_key = env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);
        if api_key.is_none() && provider == LlmProvider::OpenAi {
            tracing::warn!("LLM_API_KEY is not set; assistant requests will fail validation");
        }

        let redis_url = match backend {
            StorageBackend::Redis => Some(Secret::new(get_env(
                "REDIS_URL",
                Some("redis://localhost:6379"),
                is_prod,
            )?)),
            StorageBackend::Memory => None,
        };

        Ok(ChatbotConfig {
            common: common_config,
            llm: LlmConfig {
                provider,
                api_key,
                api_url: get_env("LLM_API_URL", Some(DEFAULT_API_URL), is_prod)?,
                model: get_env("LLM_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                temperature: parse_env("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
                max_tokens: parse_env("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", 30)?,
                max_retries: parse_env("LLM_MAX_RETRIES", 2)?,
                initial_backoff_ms: parse_env("LLM_INITIAL_BACKOFF_MS", 1000)?,
            },
            storage: StorageConfig {
                backend,
                redis_url,
                session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
                storage_key: get_env("CHAT_STORAGE_KEY", Some(DEFAULT_STORAGE_KEY), is_prod)?,
            },
        })
    }
}

impl LlmConfig {
    pub fn client_config(&self) -> LlmClientConfig {
        LlmClientConfig {
            api_key: self.api_key.clone(),
            api_url: self.api_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryConfig {
                max_retries: self.max_retries,
                ..RetryConfig::with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
            },
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}
