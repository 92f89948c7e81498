//! Object model and store-client surface for the converge engine.
//!
//! This crate defines the minimal shape of a managed resource — a
//! namespaced, versioned [`Object`] with metadata, a dynamic spec payload,
//! and a status [`Conditions`] slot — plus the [`StoreClient`] capability
//! set the engine executes actions against:
//!
//! - **Get/Create/Update/Delete**: whole-object round trips
//! - **`update_status`**: status-subresource writes
//!
//! Concurrency control belongs to the store: every write bumps a resource
//! version, and stale writes surface as [`StoreError::Conflict`] for the
//! caller to retry from fresh reads.
//!
//! [`MemoryStore`] is the reference implementation used by tests, and
//! [`RecordingStore`] wraps any client with an op log for asserting which
//! store calls a reconciliation actually made.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod client;
pub mod condition;
pub mod error;
pub mod memory;
pub mod object;

// Re-export main types
pub use client::{StoreClient, TracingStore};
pub use condition::{Condition, ConditionStatus, Conditions};
pub use error::{Result, StoreError};
pub use memory::{MemoryStore, RecordingStore, StoreOp};
pub use object::{Object, ObjectKey, ObjectMeta, ObjectStatus, OwnerReference, Uid};
