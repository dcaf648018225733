//! Publisher utilities and helpers

use crate::bus::EventBus;
use crate::dispatch::RaiseReport;
use crate::events::{Event, TopicEvent};
use crate::topic::TopicPath;

/// Helper for raising events on one fixed topic
pub struct Publisher<E = Event> {
    bus: EventBus<E>,
    topic: TopicPath,
}

impl<E: TopicEvent> Publisher<E> {
    /// Create new publisher bound to `topic`
    pub fn new(bus: EventBus<E>, topic: &str) -> Self {
        Self {
            bus,
            topic: TopicPath::parse(topic),
        }
    }

    pub fn topic(&self) -> &TopicPath {
        &self.topic
    }

    pub fn bus(&self) -> &EventBus<E> {
        &self.bus
    }

    /// Raise an event built for this publisher's topic
    pub fn publish_with<F>(&self, build: F) -> RaiseReport
    where
        F: FnOnce(&TopicPath) -> E,
    {
        self.bus.raise(&build(&self.topic))
    }
}

impl Publisher<Event> {
    /// Raise a payload-free event on this topic
    pub fn publish(&self) -> RaiseReport {
        self.publish_with(|topic| Event::new(topic.as_str()))
    }

    /// Raise an event with a JSON payload on this topic
    pub fn publish_payload(&self, payload: serde_json::Value) -> RaiseReport {
        self.publish_with(|topic| Event::with_payload(topic.as_str(), payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_publisher_raises_on_bound_topic() {
        let bus = EventBus::<Event>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        bus.subscribe_fn("/combat", "log", move |event: &Event| {
            log.lock().push(event.clone());
            Ok(())
        })
        .unwrap();

        let publisher = Publisher::new(bus.clone(), "combat//hit/");
        assert_eq!(publisher.topic(), &TopicPath::parse("/combat/hit"));

        publisher.publish();
        let report = publisher.publish_payload(json!({ "damage": 3 }));

        assert_eq!(report.delivered(), 1);
        assert_eq!(
            *seen.lock(),
            vec![
                Event::new("/combat/hit"),
                Event::with_payload("/combat/hit", json!({ "damage": 3 })),
            ]
        );
        assert_eq!(publisher.bus().topic_count(), 3);
    }
}
