//! Domain models for the chatbot.

pub mod context;
pub mod error;
pub mod message;
pub mod session;

pub use context::{AppInfo, ChatContext, APP_INFO};
pub use error::{ChatError, ChatErrorKind};
pub use message::{Message, Role};
pub use session::SessionState;
