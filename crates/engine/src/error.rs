//! Error types for the engine crate.

use thiserror::Error;

use converge_store::StoreError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types.
///
/// Store causes are carried verbatim so callers can tell a concurrency
/// conflict (retry from fresh reads) from a fatal validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A decision thunk or pre-write hook failed.
    #[error("decision failed: {reason}")]
    Decision { reason: String },

    /// The last-applied snapshot annotation could not be parsed.
    #[error("malformed last-applied snapshot: {reason}")]
    Snapshot { reason: String },

    /// Invalid engine configuration.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// The reconciliation was cancelled.
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a decision error.
    pub fn decision(reason: impl Into<String>) -> Self {
        Self::Decision {
            reason: reason.into(),
        }
    }

    /// Create a snapshot error.
    pub fn snapshot(reason: impl Into<String>) -> Self {
        Self::Snapshot {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Whether the underlying cause is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }
}
