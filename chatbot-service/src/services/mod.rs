pub mod context;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod session_store;
pub mod storage;

pub use context::build_context;
pub use prompt::build_system_prompt;
pub use providers::{ChatAssistant, LlmClient, LlmClientConfig, MockAssistant};
pub use registry::SessionRegistry;
pub use session_store::{ChatController, ChatSnapshot, SendOutcome};
pub use storage::{MemorySessionStorage, RedisSessionStorage, SessionStorage};
