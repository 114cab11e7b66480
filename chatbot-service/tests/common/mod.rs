use chatbot_service::config::{
    ChatbotConfig, LlmConfig, LlmProvider, StorageBackend, StorageConfig, DEFAULT_STORAGE_KEY,
};
use chatbot_service::startup::Application;
use suria_core::config::Config;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub fn test_config() -> ChatbotConfig {
    ChatbotConfig {
        common: Config { port: 0 },
        llm: LlmConfig {
            provider: LlmProvider::Mock,
            api_key: None,
            api_url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
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
    }
}

pub async fn spawn_app(config: ChatbotConfig) -> TestApp {
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(app.run_until_stopped(std::future::pending()));

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}
