//! Topic tree
//!
//! [`TopicTree`] owns the root node and resolves topic strings to nodes. Next
//! to the live nodes it keeps a layer index (depth → topics at that depth) that
//! tooling reads to rebuild the tree's shape without touching node internals.
//!
//! The tree is plain single-owner state; [`EventBus`](crate::EventBus) is the
//! thread-safe wrapper.

use crate::config::BusConfig;
use crate::dispatch::{DispatchPlan, RaiseReport};
use crate::events::TopicEvent;
use crate::node::{NodeArena, NodeId, TopicNode};
use crate::notify::{Notifier, TreeNotification};
use crate::snapshot::TopicSnapshot;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::topic::{tokenize, TopicPath, SEPARATOR};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Depth (root = 0) → topics known at that depth
pub type TreeLayers = BTreeMap<usize, BTreeSet<TopicPath>>;

pub struct TopicTree<E> {
    nodes: NodeArena<E>,
    layers: TreeLayers,
    notifier: Notifier,
    materialize_on_unsubscribe: bool,
}

impl<E> TopicTree<E> {
    /// Tree with default configuration
    pub fn new() -> Self {
        Self::with_config(&BusConfig::default())
    }

    pub fn with_config(config: &BusConfig) -> Self {
        Self::with_notifier(
            Notifier::new(config.notification_capacity, config.instrumentation),
            config.materialize_on_unsubscribe,
        )
    }

    pub(crate) fn with_notifier(notifier: Notifier, materialize_on_unsubscribe: bool) -> Self {
        let mut layers = TreeLayers::new();
        layers.entry(0).or_default().insert(TopicPath::root());

        Self {
            nodes: NodeArena::new(),
            layers,
            notifier,
            materialize_on_unsubscribe,
        }
    }

    /// Subscribe to `topic`, creating it if needed.
    pub fn subscribe_to_topic(&mut self, topic: &str, subscriber: Subscriber<E>) -> NodeId {
        let id = self.get_or_create_topic(topic);
        let node = self.node_mut(id);
        let label = subscriber.label().to_string();
        let count = node.subscribe(subscriber);

        debug!(topic = %node.path(), %label, count, "Subscribed to topic");
        self.notify_subscribers_changed(id);
        id
    }

    /// Remove one occurrence of `subscriber` from `topic`.
    ///
    /// Returns whether anything was removed. Unknown topics and ids are a
    /// no-op; the topic is only created when `materialize_on_unsubscribe` is
    /// set.
    pub fn unsubscribe_from_topic(&mut self, topic: &str, subscriber: SubscriberId) -> bool {
        let id = if self.materialize_on_unsubscribe {
            Some(self.get_or_create_topic(topic))
        } else {
            self.get_topic(topic)
        };
        let Some(id) = id else {
            debug!(topic, %subscriber, "Unsubscribe from unknown topic ignored");
            return false;
        };

        let node = self.node_mut(id);
        let removed = node.unsubscribe(subscriber);
        debug!(topic = %node.path(), %subscriber, removed, "Unsubscribed from topic");
        self.notify_subscribers_changed(id);
        removed
    }

    /// Resolve `topic` without creating anything.
    pub fn get_topic(&self, topic: &str) -> Option<NodeId> {
        self.nodes.get_subtopic(NodeId::ROOT, tokenize(topic))
    }

    pub fn node(&self, id: NodeId) -> Option<&TopicNode<E>> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> &TopicNode<E> {
        self.nodes.root()
    }

    pub fn nodes(&self) -> &NodeArena<E> {
        &self.nodes
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Nodes in the tree, root included
    pub fn topic_count(&self) -> usize {
        self.nodes.len()
    }

    /// Snapshot the ancestor chain of `topic`, creating the topic if needed.
    ///
    /// Emits `NodeActivated` for every node on the chain.
    pub fn prepare_raise(&mut self, topic: &str) -> DispatchPlan<E> {
        let id = self.get_or_create_topic(topic);
        self.notify_activated(id);
        self.nodes.dispatch_plan(id)
    }

    /// Get or create the node for `topic`, keeping the layer index in step.
    fn get_or_create_topic(&mut self, topic: &str) -> NodeId {
        let mut composed = String::with_capacity(topic.len());
        let mut segments = Vec::new();
        for (depth, segment) in tokenize(topic).enumerate() {
            composed.push(SEPARATOR);
            composed.push_str(segment);
            segments.push(segment);

            let layer = self.layers.entry(depth + 1).or_default();
            if !layer.contains(composed.as_str()) {
                layer.insert(TopicPath::parse(&composed));
            }
        }

        let (id, created) = match self.nodes.get_or_create_subtopic(NodeId::ROOT, segments) {
            Some(found) => found,
            None => unreachable!("root missing from its own arena"),
        };
        if created {
            debug!(topic, topic_count = self.nodes.len(), "Topic tree grew");
            self.notifier.emit(TreeNotification::TreeChanged {
                topic_count: self.nodes.len(),
            });
        }
        id
    }

    // Ids passed here were just handed out by this tree's own arena.
    fn node_mut(&mut self, id: NodeId) -> &mut TopicNode<E> {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => unreachable!("node {id:?} missing from its own arena"),
        }
    }

    fn notify_subscribers_changed(&self, id: NodeId) {
        if !self.notifier.is_enabled() {
            return;
        }
        if let Some(node) = self.nodes.get(id) {
            self.notifier.emit(TreeNotification::SubscribersChanged {
                topic: node.path().clone(),
                count: node.subscriber_count(),
            });
        }
    }

    fn notify_activated(&self, id: NodeId) {
        if !self.notifier.is_enabled() {
            return;
        }
        for node_id in self.nodes.ancestors(id) {
            if let Some(node) = self.nodes.get(node_id) {
                self.notifier.emit(TreeNotification::NodeActivated {
                    topic: node.path().clone(),
                });
            }
        }
    }

    // ---- Introspection ----

    /// Full layer index
    pub fn tree_layers(&self) -> &TreeLayers {
        &self.layers
    }

    /// Topics recorded at `depth` (0 = root)
    pub fn node_count_in_layer(&self, depth: usize) -> usize {
        self.layers.get(&depth).map_or(0, BTreeSet::len)
    }

    /// Direct children of `topic` across all layers
    pub fn children_count_for_topic(&self, topic: &str) -> usize {
        let parent = TopicPath::parse(topic);
        self.layers
            .values()
            .map(|layer| layer.iter().filter(|t| parent.is_parent_of(t)).count())
            .sum()
    }

    /// Topics whose children are the deepest known topics of their branch.
    ///
    /// Layers are walked deepest first; a topic contributes its parent unless
    /// the result already holds the topic, its parent, or one of its siblings.
    /// The output is in discovery order (deepest first).
    pub fn tree_leaves_parents(&self) -> Vec<TopicPath> {
        let mut result: Vec<TopicPath> = Vec::new();
        for topics in self.layers.values().rev() {
            for topic in topics {
                let Some(parent) = topic.parent() else {
                    continue;
                };
                let redundant = result
                    .iter()
                    .any(|known| known == topic || known == parent || parent.is_parent_of(known));
                if !redundant {
                    result.push(parent.clone());
                }
            }
        }
        result
    }

    /// Subscribers attached directly to `topic`; 0 for unknown topics
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.get_topic(topic)
            .and_then(|id| self.nodes.get(id))
            .map_or(0, TopicNode::subscriber_count)
    }

    /// Labels of subscribers attached directly to `topic`
    pub fn subscriber_descriptions(&self, topic: &str) -> Vec<String> {
        self.get_topic(topic)
            .and_then(|id| self.nodes.get(id))
            .map(TopicNode::subscriber_descriptions)
            .unwrap_or_default()
    }

    /// Subscribers across the whole tree
    pub fn total_subscribers(&self) -> usize {
        self.nodes.iter().map(|(_, node)| node.subscriber_count()).sum()
    }

    /// Serializable copy of the whole tree
    pub fn snapshot(&self) -> TopicSnapshot {
        match TopicSnapshot::capture(&self.nodes, NodeId::ROOT) {
            Some(snapshot) => snapshot,
            None => unreachable!("root node always exists"),
        }
    }

    /// Drop every subscription, keeping the topics. Returns how many were
    /// dropped.
    pub fn clear_subscribers(&mut self) -> usize {
        let mut dropped = 0;
        for node in self.nodes.iter_mut() {
            dropped += node.clear_subscribers();
        }
        dropped
    }
}

impl<E: TopicEvent> TopicTree<E> {
    /// Raise `event` on its topic and run the ancestor-chain cascade.
    ///
    /// Never fails; callback failures are collected in the report.
    pub fn raise(&mut self, event: &E) -> RaiseReport {
        let id = self.get_or_create_topic(event.topic());
        self.notify_activated(id);
        self.nodes.invoke_subscribers_callbacks(id, event)
    }
}

impl<E> Default for TopicTree<E> {
    fn default() -> Self {
        Self::new()
    }
}
