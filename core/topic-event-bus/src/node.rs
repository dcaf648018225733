//! Topic tree nodes
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeId`]. A
//! node's `children` map is the owning edge; `parent` is a plain index used
//! only to walk upwards. Nodes are never removed, so an id handed out by an
//! arena stays valid for the arena's lifetime.

use crate::dispatch::{DispatchPlan, RaiseReport};
use crate::subscriber::{Subscriber, SubscriberId};
use crate::topic::{TopicPath, ROOT, SEPARATOR};
use std::collections::BTreeMap;
use tracing::debug;

/// Index of a node inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Single topic in the tree with its own multicast subscriber list
pub struct TopicNode<E> {
    /// Full path with trailing separator, `/` for the root
    topic: String,
    path: TopicPath,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
    subscribers: Vec<Subscriber<E>>,
}

impl<E> TopicNode<E> {
    fn new(topic: String, parent: Option<NodeId>) -> Self {
        let path = TopicPath::parse(&topic);
        Self {
            topic,
            path,
            parent,
            children: BTreeMap::new(),
            subscribers: Vec::new(),
        }
    }

    /// Full topic with trailing separator, e.g. `/combat/hit/`
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Canonical path of this node, e.g. `/combat/hit`
    pub fn path(&self) -> &TopicPath {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Direct children keyed by segment, in segment order
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(segment, id)| (segment.as_str(), *id))
    }

    pub fn child(&self, segment: &str) -> Option<NodeId> {
        self.children.get(segment).copied()
    }

    /// Append a subscriber; returns the new count.
    pub fn subscribe(&mut self, subscriber: Subscriber<E>) -> usize {
        self.subscribers.push(subscriber);
        self.subscribers.len()
    }

    /// Remove the most recently added occurrence of `id`.
    ///
    /// Returns whether something was removed. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        match self.subscribers.iter().rposition(|s| s.id() == id) {
            Some(pos) => {
                self.subscribers.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribers(&self) -> &[Subscriber<E>] {
        &self.subscribers
    }

    /// Labels of attached callbacks, in subscription order
    pub fn subscriber_descriptions(&self) -> Vec<String> {
        self.subscribers
            .iter()
            .map(|s| s.label().to_string())
            .collect()
    }

    pub(crate) fn clear_subscribers(&mut self) -> usize {
        let dropped = self.subscribers.len();
        self.subscribers.clear();
        dropped
    }
}

/// Owner of every node in one tree
pub struct NodeArena<E> {
    nodes: Vec<TopicNode<E>>,
}

impl<E> NodeArena<E> {
    /// Arena holding only the root node `/`
    pub fn new() -> Self {
        Self {
            nodes: vec![TopicNode::new(ROOT.to_string(), None)],
        }
    }

    pub fn root(&self) -> &TopicNode<E> {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TopicNode<E>> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TopicNode<E>> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TopicNode<E>)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TopicNode<E>> {
        self.nodes.iter_mut()
    }

    /// Walk `segments` below `from`, creating any missing node on the way.
    ///
    /// Returns the terminal node and whether any node was created, or `None`
    /// when `from` does not belong to this arena.
    pub fn get_or_create_subtopic<'a, I>(
        &mut self,
        from: NodeId,
        segments: I,
    ) -> Option<(NodeId, bool)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.get(from)?;
        let mut current = from;
        let mut created = false;

        for segment in segments {
            current = match self.nodes[current.0].child(segment) {
                Some(next) => next,
                None => {
                    let next = NodeId(self.nodes.len());
                    let topic = format!("{}{}{}", self.nodes[current.0].topic, segment, SEPARATOR);
                    debug!("Creating topic node: {}", topic);

                    self.nodes.push(TopicNode::new(topic, Some(current)));
                    self.nodes[current.0]
                        .children
                        .insert(segment.to_string(), next);
                    created = true;
                    next
                }
            };
        }

        Some((current, created))
    }

    /// Walk `segments` below `from` without creating anything.
    pub fn get_subtopic<'a, I>(&self, from: NodeId, segments: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments
            .into_iter()
            .try_fold(from, |current, segment| self.get(current)?.child(segment))
    }

    /// `id` followed by each of its ancestors up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, E> {
        Ancestors {
            arena: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// Depth of a node, root is 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }

    /// Invoke the subscribers of `id`, then of each ancestor up to the root.
    pub fn invoke_subscribers_callbacks(&self, id: NodeId, event: &E) -> RaiseReport {
        let mut report = RaiseReport::default();
        for node_id in self.ancestors(id) {
            let node = &self.nodes[node_id.0];
            if node_id == id {
                report.topic = node.path.clone();
            }
            report.invoke_level(&node.path, &node.subscribers, event);
        }
        report
    }

    /// Snapshot the subscriber lists along the ancestor chain of `id`.
    pub fn dispatch_plan(&self, id: NodeId) -> DispatchPlan<E> {
        let topic = self
            .get(id)
            .map(|node| node.path.clone())
            .unwrap_or_default();
        let mut plan = DispatchPlan::new(topic);
        for node_id in self.ancestors(id) {
            let node = &self.nodes[node_id.0];
            plan.push_level(node.path.clone(), node.subscribers.clone());
        }
        plan
    }
}

impl<E> Default for NodeArena<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Upward iterator over a node and its ancestors
pub struct Ancestors<'a, E> {
    arena: &'a NodeArena<E>,
    next: Option<NodeId>,
}

impl<E> Iterator for Ancestors<'_, E> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.get(current).and_then(|node| node.parent);
        Some(current)
    }
}
