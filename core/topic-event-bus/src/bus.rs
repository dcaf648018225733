//! Core event bus implementation

use crate::config::BusConfig;
use crate::dispatch::RaiseReport;
use crate::error::{BusError, Result};
use crate::events::{Event, TopicEvent};
use crate::notify::{Notifier, TreeNotification};
use crate::recorder::{RaiseRecord, RaiseRecorder};
use crate::snapshot::TopicSnapshot;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::topic::TopicPath;
use crate::tree::{TopicTree, TreeLayers};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Hierarchical pub/sub bus shared by cheap clones
///
/// One coarse lock guards the tree. A raise resolves its topic and snapshots
/// the subscribers of the whole ancestor chain under the lock, then runs the
/// callbacks with the lock released. Callbacks may therefore subscribe,
/// unsubscribe or raise again; such changes apply to later raises only.
pub struct EventBus<E = Event> {
    tree: Arc<Mutex<TopicTree<E>>>,

    /// Clone of the tree's notifier so receivers can be handed out lock-free
    notifier: Notifier,

    /// Raise recorder (optional)
    recorder: Option<Arc<RaiseRecorder>>,

    /// Statistics per raised topic
    stats: Arc<DashMap<TopicPath, TopicStats>>,

    shut_down: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicStats {
    pub raised: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl<E: TopicEvent> EventBus<E> {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::build(BusConfig::default())
    }

    /// Create an event bus from a validated configuration
    pub fn with_config(config: BusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create event bus with recording enabled
    pub fn with_recording(capacity: usize) -> Self {
        Self::build(BusConfig::default().with_recording(capacity))
    }

    fn build(config: BusConfig) -> Self {
        let notifier = Notifier::new(config.notification_capacity, config.instrumentation);
        let tree = TopicTree::with_notifier(notifier.clone(), config.materialize_on_unsubscribe);

        Self {
            tree: Arc::new(Mutex::new(tree)),
            notifier,
            recorder: config
                .record_capacity
                .map(|capacity| Arc::new(RaiseRecorder::new(capacity))),
            stats: Arc::new(DashMap::new()),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attach `subscriber` to `topic`
    pub fn subscribe(&self, topic: &str, subscriber: Subscriber<E>) -> Result<SubscriberId> {
        let id = subscriber.id();
        let mut tree = self.tree.lock();
        // shutdown flips the flag under this lock
        self.ensure_running()?;
        tree.subscribe_to_topic(topic, subscriber);
        Ok(id)
    }

    /// Attach a closure to `topic` under a display label
    pub fn subscribe_fn<F>(&self, topic: &str, label: &str, callback: F) -> Result<SubscriberId>
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, Subscriber::new(label, callback))
    }

    /// Subscribe to the topic `event` is raised on
    pub fn subscribe_event(&self, event: &E, subscriber: Subscriber<E>) -> Result<SubscriberId> {
        self.subscribe(event.topic(), subscriber)
    }

    /// Detach one occurrence of `subscriber` from `topic`; unknown ids are ignored.
    pub fn unsubscribe(&self, topic: &str, subscriber: SubscriberId) -> bool {
        self.tree.lock().unsubscribe_from_topic(topic, subscriber)
    }

    pub fn unsubscribe_event(&self, event: &E, subscriber: SubscriberId) -> bool {
        self.unsubscribe(event.topic(), subscriber)
    }

    /// Raise `event` on its topic and every ancestor up to the root
    ///
    /// Never fails: callback errors and panics are logged and returned in the
    /// report. After [`shutdown`](Self::shutdown) this is a no-op.
    pub fn raise(&self, event: &E) -> RaiseReport {
        let plan = {
            let mut tree = self.tree.lock();
            if self.is_shut_down() {
                debug!(topic = event.topic(), "Raise on shut down bus ignored");
                return RaiseReport::new(TopicPath::parse(event.topic()));
            }
            tree.prepare_raise(event.topic())
        };
        let report = plan.run(event);

        self.increment_stat(&report.topic, |s| {
            s.raised += 1;
            s.delivered += report.delivered() as u64;
            s.failed += report.failures.len() as u64;
        });
        if let Some(recorder) = &self.recorder {
            recorder.record(RaiseRecord::from_report(&report));
        }

        report
    }

    /// Drop every subscription and refuse new ones. Topics are kept for
    /// inspection. Returns the number of subscriptions dropped.
    pub fn shutdown(&self) -> usize {
        let mut tree = self.tree.lock();
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let dropped = tree.clear_subscribers();
        drop(tree);
        info!(dropped, "Event bus shut down");
        dropped
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(BusError::ShutDown);
        }
        Ok(())
    }

    /// Stream of structural and activity notifications
    pub fn notifications(&self) -> broadcast::Receiver<TreeNotification> {
        self.notifier.subscribe()
    }

    /// Read access to the tree under the bus lock.
    ///
    /// Do not call back into the bus from `f`.
    pub fn with_tree<R>(&self, f: impl FnOnce(&TopicTree<E>) -> R) -> R {
        f(&*self.tree.lock())
    }

    pub fn tree_layers(&self) -> TreeLayers {
        self.tree.lock().tree_layers().clone()
    }

    pub fn node_count_in_layer(&self, depth: usize) -> usize {
        self.tree.lock().node_count_in_layer(depth)
    }

    pub fn children_count_for_topic(&self, topic: &str) -> usize {
        self.tree.lock().children_count_for_topic(topic)
    }

    pub fn tree_leaves_parents(&self) -> Vec<TopicPath> {
        self.tree.lock().tree_leaves_parents()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.tree.lock().subscriber_count(topic)
    }

    pub fn subscriber_descriptions(&self, topic: &str) -> Vec<String> {
        self.tree.lock().subscriber_descriptions(topic)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.tree.lock().get_topic(topic).is_some()
    }

    pub fn topic_count(&self) -> usize {
        self.tree.lock().topic_count()
    }

    pub fn snapshot(&self) -> TopicSnapshot {
        self.tree.lock().snapshot()
    }

    /// Get statistics for every raised topic, ordered by topic
    pub fn stats(&self) -> Vec<(TopicPath, TopicStats)> {
        let mut stats: Vec<_> = self
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }

    pub fn topic_stats(&self, topic: &str) -> Option<TopicStats> {
        self.stats
            .get(TopicPath::parse(topic).as_str())
            .map(|s| s.clone())
    }

    /// Get raise recorder
    pub fn recorder(&self) -> Option<Arc<RaiseRecorder>> {
        self.recorder.clone()
    }

    fn increment_stat<F>(&self, topic: &TopicPath, f: F)
    where
        F: FnOnce(&mut TopicStats),
    {
        let mut entry = self.stats.entry(topic.clone()).or_default();
        f(entry.value_mut());
    }
}

impl<E: TopicEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            notifier: self.notifier.clone(),
            recorder: self.recorder.clone(),
            stats: self.stats.clone(),
            shut_down: self.shut_down.clone(),
        }
    }
}
