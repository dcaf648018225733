//! Subscriber handles
//!
//! A [`Subscriber`] pairs a callback with a process-unique [`SubscriberId`] and
//! a human-readable label. Cloning a subscriber keeps its identity, so the same
//! handle can be attached to several topics and detached again by id.

use crate::error::CallbackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback signature for subscribers
pub type Callback<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// Identity of a subscriber handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Labelled callback attached to a topic node
pub struct Subscriber<E> {
    id: SubscriberId,
    label: Arc<str>,
    callback: Callback<E>,
}

impl<E> Subscriber<E> {
    /// Create a subscriber with a display label
    pub fn new<F>(label: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let label: String = label.into();
        Self {
            id: SubscriberId::next(),
            label: Arc::from(label),
            callback: Arc::new(callback),
        }
    }

    /// Create a subscriber from an infallible closure
    pub fn from_fn<F>(label: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::new(label, move |event: &E| {
            callback(event);
            Ok(())
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Label shown by tooling
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the callback, turning returned errors and panics into a
    /// [`CallbackError`] so the caller can keep going.
    pub fn invoke(&self, event: &E) -> Result<(), CallbackError> {
        match catch_unwind(AssertUnwindSafe(|| (self.callback)(event))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(CallbackError::Failed(format!("{err:#}"))),
            Err(panic) => {
                let message = if let Some(msg) = panic.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(CallbackError::Panicked(message))
            }
        }
    }
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: Arc::clone(&self.label),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> fmt::Debug for Subscriber<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
