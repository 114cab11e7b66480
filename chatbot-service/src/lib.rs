//! Context-aware assistant for the Suria portal.
//!
//! The crate holds the chatbot core (message model, route context, LLM client,
//! session controller) and a small HTTP adapter the widget talks to.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
