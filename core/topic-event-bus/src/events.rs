//! Event type definitions
//!
//! The tree treats events as opaque payloads; the only thing it needs from an
//! event is the topic it was raised on.

use crate::topic::TopicPath;
use serde::{Deserialize, Serialize};

/// Anything that can be raised on the bus
pub trait TopicEvent: Send + Sync {
    /// Raw topic string, normalized by the tree on raise
    fn topic(&self) -> &str;
}

/// Plain event record: a topic plus an arbitrary JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Event {
    /// Event without payload
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Event carrying a JSON payload
    pub fn with_payload(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Canonical form of this event's topic
    pub fn topic_path(&self) -> TopicPath {
        TopicPath::parse(&self.topic)
    }
}

impl TopicEvent for Event {
    fn topic(&self) -> &str {
        &self.topic
    }
}

impl TopicEvent for String {
    fn topic(&self) -> &str {
        self
    }
}

impl TopicEvent for &'static str {
    fn topic(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_topic_path() {
        let event = Event::new("combat//hit/");
        assert_eq!(event.topic(), "combat//hit/");
        assert_eq!(event.topic_path(), "/combat/hit");
    }

    #[test]
    fn test_event_serde() {
        let event = Event::with_payload("/combat/hit", json!({ "damage": 12 }));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "topic": "/combat/hit", "payload": { "damage": 12 } }));

        let bare: Event = serde_json::from_str(r#"{ "topic": "/ui" }"#).unwrap();
        assert_eq!(bare, Event::new("/ui"));
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"topic":"/ui"}"#);
    }
}
