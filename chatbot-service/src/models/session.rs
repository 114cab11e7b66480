//! Persisted conversation state of one browser session.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Widget visibility plus the conversation, in insertion (chronological) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_open: bool,
    pub messages: Vec<Message>,
}

impl SessionState {
    /// Append a message, clamping its timestamp so the list never goes back in time.
    pub fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    #[test]
    fn serializes_with_camel_case_keys_and_iso_timestamps() {
        let mut state = SessionState {
            is_open: true,
            ..Default::default()
        };
        state.push(Message::user("hola").unwrap());

        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        assert_eq!(value["isOpen"], true);
        let message = &value["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(message["content"], "hola");
        let timestamp = message["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn round_trips_without_loss() {
        let mut state = SessionState::default();
        state.push(Message::user("¿Qué es UPME?").unwrap());
        state.push(Message::assistant("UPME es..."));

        let restored = SessionState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn push_keeps_timestamps_non_decreasing() {
        let mut state = SessionState::default();
        let first = Message::assistant("primero");
        let mut second = Message::new(Role::User, "segundo");
        second.timestamp = first.timestamp - Duration::seconds(5);
        let first_ts = first.timestamp;

        state.push(first);
        state.push(second);

        assert_eq!(state.messages[1].timestamp, first_ts);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(SessionState::from_json("{not json").is_err());
        assert!(SessionState::from_json(r#"{"isOpen": "yes"}"#).is_err());
    }
}
