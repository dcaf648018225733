//! Serializable view of the live tree
//!
//! Tooling that cannot hold the tree lock (or lives in another process
//! reading a dump) renders from a [`TopicSnapshot`] instead of the nodes.

use crate::node::{NodeArena, NodeId};
use crate::topic::TopicPath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub topic: TopicPath,
    /// Labels of attached subscribers, in subscription order
    pub subscribers: Vec<String>,
    /// Child topics ordered by segment
    pub children: Vec<TopicSnapshot>,
}

impl TopicSnapshot {
    /// Capture the subtree rooted at `id`
    pub fn capture<E>(nodes: &NodeArena<E>, id: NodeId) -> Option<Self> {
        let node = nodes.get(id)?;
        Some(Self {
            topic: node.path().clone(),
            subscribers: node.subscriber_descriptions(),
            children: node
                .children()
                .filter_map(|(_, child)| Self::capture(nodes, child))
                .collect(),
        })
    }

    /// Nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Subscribers attached anywhere in this subtree
    pub fn subscriber_total(&self) -> usize {
        self.subscribers.len()
            + self
                .children
                .iter()
                .map(Self::subscriber_total)
                .sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Find a topic inside this subtree
    pub fn find(&self, topic: &str) -> Option<&TopicSnapshot> {
        let target = TopicPath::parse(topic);
        if self.topic == target {
            return Some(self);
        }
        if !self.topic.is_ancestor_of(&target) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(target.as_str()))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
