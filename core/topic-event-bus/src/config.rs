//! Bus configuration
//!
//! ```toml
//! instrumentation = true
//! notification_capacity = 1024
//! materialize_on_unsubscribe = false
//! record_capacity = 256
//! ```

use crate::error::{BusError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default capacity of the notification broadcast channel
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Emit tree/subscriber/activation notifications
    pub instrumentation: bool,

    /// Buffered notifications per receiver before the oldest are dropped
    pub notification_capacity: usize,

    /// Let `unsubscribe` create the addressed topic when it does not exist
    pub materialize_on_unsubscribe: bool,

    /// Keep the last N raises in a [`RaiseRecorder`](crate::RaiseRecorder)
    pub record_capacity: Option<usize>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            instrumentation: true,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            materialize_on_unsubscribe: false,
            record_capacity: None,
        }
    }
}

impl BusConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BusError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.notification_capacity == 0 {
            return Err(BusError::InvalidConfig {
                field: "notification_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        if self.record_capacity == Some(0) {
            return Err(BusError::InvalidConfig {
                field: "record_capacity",
                reason: "must be greater than zero when set".into(),
            });
        }
        Ok(())
    }

    pub fn with_instrumentation(mut self, enabled: bool) -> Self {
        self.instrumentation = enabled;
        self
    }

    pub fn with_recording(mut self, capacity: usize) -> Self {
        self.record_capacity = Some(capacity);
        self
    }

    pub fn with_materialize_on_unsubscribe(mut self, enabled: bool) -> Self {
        self.materialize_on_unsubscribe = enabled;
        self
    }
}
