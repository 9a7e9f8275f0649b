//! Unified error type for the ACH gateway.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the gateway.
///
/// The RDFI scheduler relies on two properties: `LockUnavailable` is
/// distinguishable (contention is the normal case, demoted to info-level
/// logging) and `Processor` aggregates per-file failures so one bad file
/// never aborts its siblings.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("leadership unavailable for {key}: {reason}")]
    LockUnavailable { key: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("audit error: {0}")]
    Audit(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("compliance transform error: {0}")]
    Compliance(String),

    #[error("ACH parse error: {0}")]
    Parse(#[from] ach::ParseError),

    #[error("{} processing error(s): {}", .0.len(), .0.join("; "))]
    Processor(Vec<String>),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manual trigger already in flight")]
    TriggerBusy,

    #[error("shutting down")]
    ShuttingDown,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn lock_unavailable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LockUnavailable {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn compliance(msg: impl Into<String>) -> Self {
        Self::Compliance(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means another instance already holds leadership.
    pub fn is_lock_unavailable(&self) -> bool {
        matches!(self, Self::LockUnavailable { .. })
    }
}
