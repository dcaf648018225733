//! Ancestor-chain dispatch
//!
//! A raise on `/a/b/c` runs the subscribers of `/a/b/c`, then `/a/b`, `/a` and
//! finally `/`. Each callback runs in isolation: an error or panic is logged,
//! recorded in the [`RaiseReport`] and the cascade carries on.

use crate::error::CallbackError;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::topic::TopicPath;
use serde::Serialize;
use tracing::warn;

/// A callback that failed during a raise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackFailure {
    pub subscriber: SubscriberId,
    pub label: String,
    /// Topic the failing subscriber was attached to
    pub topic: TopicPath,
    #[serde(serialize_with = "serialize_display")]
    pub error: CallbackError,
}

fn serialize_display<S: serde::Serializer>(
    error: &CallbackError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of a single raise
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RaiseReport {
    /// Topic the event was raised on
    pub topic: TopicPath,
    /// Nodes on the ancestor chain, raised node and root included
    pub nodes_visited: usize,
    /// Callbacks attempted
    pub invoked: usize,
    pub failures: Vec<CallbackFailure>,
}

impl RaiseReport {
    pub fn new(topic: TopicPath) -> Self {
        Self {
            topic,
            ..Self::default()
        }
    }

    /// Callbacks that completed without error
    pub fn delivered(&self) -> usize {
        self.invoked.saturating_sub(self.failures.len())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Invoke one level of the chain in subscription order.
    pub(crate) fn invoke_level<E>(
        &mut self,
        level: &TopicPath,
        subscribers: &[Subscriber<E>],
        event: &E,
    ) {
        self.nodes_visited += 1;
        for subscriber in subscribers {
            self.invoked += 1;
            if let Err(error) = subscriber.invoke(event) {
                warn!(
                    topic = %level,
                    subscriber = %subscriber.id(),
                    label = subscriber.label(),
                    "Subscriber callback failed: {}",
                    error
                );
                self.failures.push(CallbackFailure {
                    subscriber: subscriber.id(),
                    label: subscriber.label().to_string(),
                    topic: level.clone(),
                    error,
                });
            }
        }
    }
}

/// Snapshot of the subscribers on an ancestor chain, deepest level first
///
/// Taken while the tree is locked and run after the lock is released, so
/// callbacks may re-enter the bus.
pub struct DispatchPlan<E> {
    topic: TopicPath,
    levels: Vec<(TopicPath, Vec<Subscriber<E>>)>,
}

impl<E> DispatchPlan<E> {
    pub(crate) fn new(topic: TopicPath) -> Self {
        Self {
            topic,
            levels: Vec::new(),
        }
    }

    pub(crate) fn push_level(&mut self, level: TopicPath, subscribers: Vec<Subscriber<E>>) {
        self.levels.push((level, subscribers));
    }

    pub fn topic(&self) -> &TopicPath {
        &self.topic
    }

    /// Topics on the chain, deepest first
    pub fn levels(&self) -> impl Iterator<Item = &TopicPath> {
        self.levels.iter().map(|(level, _)| level)
    }

    /// Total callbacks the plan will attempt
    pub fn subscriber_count(&self) -> usize {
        self.levels.iter().map(|(_, subs)| subs.len()).sum()
    }

    /// Run every callback on the chain, deepest level first.
    pub fn run(&self, event: &E) -> RaiseReport {
        let mut report = RaiseReport::new(self.topic.clone());
        for (level, subscribers) in &self.levels {
            report.invoke_level(level, subscribers, event);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_plan_runs_deepest_first_and_isolates_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut plan = DispatchPlan::<String>::new(TopicPath::parse("/a/b"));
        let log = seen.clone();
        plan.push_level(
            TopicPath::parse("/a/b"),
            vec![
                Subscriber::from_fn("boom", |_: &String| panic!("boom")),
                Subscriber::from_fn("deep", move |_: &String| log.lock().push("deep")),
            ],
        );
        let log = seen.clone();
        plan.push_level(
            TopicPath::parse("/a"),
            vec![Subscriber::new("mid", move |_: &String| {
                log.lock().push("mid");
                anyhow::bail!("mid failed")
            })],
        );
        let log = seen.clone();
        plan.push_level(
            TopicPath::root(),
            vec![Subscriber::from_fn("root", move |_: &String| log.lock().push("root"))],
        );

        assert_eq!(plan.subscriber_count(), 4);
        let report = plan.run(&"evt".to_string());

        assert_eq!(*seen.lock(), vec!["deep", "mid", "root"]);
        assert_eq!(report.nodes_visited, 3);
        assert_eq!(report.invoked, 4);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].error.is_panic());
        assert_eq!(report.failures[0].topic, "/a/b");
        assert_eq!(report.failures[1].label, "mid");
    }

    #[test]
    fn test_delivered_never_underflows() {
        let mut report = RaiseReport::new(TopicPath::parse("/a"));
        report.failures.push(CallbackFailure {
            subscriber: Subscriber::<String>::from_fn("f", |_| {}).id(),
            label: "f".into(),
            topic: TopicPath::parse("/a"),
            error: CallbackError::Failed("late".into()),
        });
        assert_eq!(report.invoked, 0);
        assert_eq!(report.delivered(), 0);
    }

    #[test]
    fn test_empty_plan() {
        let plan = DispatchPlan::<String>::new(TopicPath::root());
        let report = plan.run(&"evt".to_string());
        assert!(report.is_clean());
        assert_eq!(report.invoked, 0);
    }
}
