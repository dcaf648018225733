//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the bus and its configuration layer
///
/// Topic parsing and tree traversal never fail; only configuration loading
/// and use of a bus after [`shutdown`](crate::EventBus::shutdown) do.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    #[error("event bus has been shut down")]
    ShutDown,
}

/// Failure of a single subscriber callback during a raise
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("callback returned an error: {0}")]
    Failed(String),

    #[error("callback panicked: {0}")]
    Panicked(String),
}

impl CallbackError {
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

pub type Result<T> = std::result::Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BusError::InvalidConfig {
            field: "notification_capacity",
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for `notification_capacity`: must be positive"
        );
        assert_eq!(BusError::ShutDown.to_string(), "event bus has been shut down");
    }

    #[test]
    fn test_callback_error_kind() {
        assert!(CallbackError::Panicked("boom".into()).is_panic());
        assert!(!CallbackError::Failed("nope".into()).is_panic());
        assert_eq!(
            CallbackError::Failed("nope".into()).to_string(),
            "callback returned an error: nope"
        );
    }
}
