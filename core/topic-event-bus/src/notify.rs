//! Structural and activity notifications for tooling
//!
//! Presentation layers subscribe to a broadcast stream of
//! [`TreeNotification`]s to re-render the tree, update subscriber counts, or
//! flash nodes reached by a raise. Emitting never blocks; with no receivers the
//! notification is simply dropped.

use crate::topic::TopicPath;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Suggested time a view keeps an activated node highlighted
pub const DEFAULT_ACTIVATION_HOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNotification {
    /// One or more nodes were created by a single traversal
    TreeChanged { topic_count: usize },

    /// Subscriber list of `topic` changed
    SubscribersChanged { topic: TopicPath, count: usize },

    /// A raise reached `topic` on its way to the root
    NodeActivated { topic: TopicPath },
}

/// Broadcast sender gated by the instrumentation flag
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<TreeNotification>,
    enabled: bool,
}

impl Notifier {
    pub fn new(capacity: usize, enabled: bool) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// New receiver; only sees notifications emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeNotification> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn emit(&self, notification: TreeNotification) {
        if !self.enabled {
            return;
        }
        // No receivers is not an error
        let _ = self.sender.send(notification);
    }
}
