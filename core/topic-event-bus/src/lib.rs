//! # Topic Event Bus
//!
//! Hierarchical publish/subscribe over slash-delimited topics.
//!
//! ## Features
//!
//! - **Ancestor delivery**: a raise on `/combat/hit` reaches subscribers of
//!   `/combat/hit`, `/combat` and `/`, deepest first
//! - **Lazy topic tree**: topics are created on first use and never removed
//! - **Isolation**: a failing or panicking callback never stops the cascade
//! - **Re-entrant**: callbacks may subscribe, unsubscribe or raise again
//! - **Introspection**: layer index, leaf parents, subscriber counts,
//!   snapshots and a notification stream for tooling
//!
//! ## Example
//!
//! ```rust
//! use topic_event_bus::{Event, EventBus};
//!
//! let bus = EventBus::<Event>::new();
//!
//! // Hear every combat event
//! bus.subscribe_fn("/combat", "combat-log", |event: &Event| {
//!     println!("Received: {}", event.topic);
//!     Ok(())
//! })
//! .unwrap();
//!
//! let report = bus.raise(&Event::new("/combat/hit"));
//! assert_eq!(report.delivered(), 1);
//! ```

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod node;
pub mod notify;
pub mod publisher;
pub mod recorder;
pub mod snapshot;
pub mod subscriber;
pub mod topic;
pub mod tree;

// Re-exports
pub use bus::{EventBus, TopicStats};
pub use config::BusConfig;
pub use dispatch::{CallbackFailure, DispatchPlan, RaiseReport};
pub use error::{BusError, CallbackError, Result};
pub use events::{Event, TopicEvent};
pub use node::{NodeArena, NodeId, TopicNode};
pub use notify::{TreeNotification, DEFAULT_ACTIVATION_HOLD};
pub use publisher::Publisher;
pub use recorder::{RaiseRecord, RaiseRecorder};
pub use snapshot::TopicSnapshot;
pub use subscriber::{Callback, Subscriber, SubscriberId};
pub use topic::TopicPath;
pub use tree::{TopicTree, TreeLayers};
