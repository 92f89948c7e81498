//! Error types for store operations.

use thiserror::Error;

use crate::object::ObjectKey;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store error types.
///
/// `NotFound` is expected and handled as a non-terminal status by the
/// engine; everything else is terminal and carried verbatim so callers can
/// distinguish conflict-retry from fatal validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: String, key: ObjectKey },

    #[error("conflict writing {kind} '{key}': {reason}")]
    Conflict {
        kind: String,
        key: ObjectKey,
        reason: String,
    },

    #[error("invalid object: {reason}")]
    Invalid { reason: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store operation cancelled")]
    Cancelled,

    #[error("serialization failed: {reason}")]
    Serialization { reason: String },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(kind: impl Into<String>, key: ObjectKey) -> Self {
        Self::NotFound {
            kind: kind.into(),
            key,
        }
    }

    /// Create a conflict error.
    pub fn conflict(kind: impl Into<String>, key: ObjectKey, reason: impl Into<String>) -> Self {
        Self::Conflict {
            kind: kind.into(),
            key,
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Whether this is the expected absent-object error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
