// Collector error taxonomy

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Runtime unreachable or version negotiation failed.
    #[error("cannot connect to container runtime at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("listing containers failed: {0}")]
    List(String),

    #[error("stats for container {id} unavailable: {reason}")]
    Fetch { id: String, reason: String },

    #[error("malformed stats payload for container {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl CollectError {
    /// Whether this error abandons the whole poll rather than a single container.
    pub fn is_fatal(&self) -> bool {
        match self {
            CollectError::Connection { .. } | CollectError::List(_) => true,
            CollectError::Timeout { operation, .. } => *operation == "list_containers",
            CollectError::Fetch { .. } | CollectError::Decode { .. } => false,
        }
    }
}
