//! HTTP handlers the chat widget talks to.

pub mod chat;
pub mod health;
