//! Ordered reconcile-action execution against a versioned object store.
//!
//! One reconciliation attempt is one [`ClientCommand::execute`] call over an
//! ordered list of [`Action`]s:
//!
//! - **Get/Create/Update/Delete**: store round trips with fixed result
//!   semantics (a missing Get is informational, a Create or Update halts
//!   with `Requeue`, a Delete continues)
//! - **Call**: a decision thunk that can splice in the next action at
//!   runtime, branching on results captured via **StoreResult** slots
//! - **UpdateStatusCondition**: merges a condition and writes the status
//!   subresource only when something actually changed
//!
//! After every action the runner applies the halt rule: `Error`, `Requeue`,
//! and `RequeueAfter` stop the pipeline; `Continue` and `NotFound` proceed;
//! an exhausted list means nothing needed to change.
//!
//! The two supporting primitives are [`PatchChecker`] — a three-way diff
//! (previous-applied snapshot vs. live vs. desired) that keeps metadata
//! churn from causing write storms — and the [`Annotator`], which stamps the
//! snapshot and controller owner references onto objects before writes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use converge_engine::{Action, ClientCommand, CreateOptions, ReconcileContext, ResultSlot, ResultStatus};
//! use converge_store::{MemoryStore, Object};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cc = ClientCommand::new(Arc::new(MemoryStore::new()));
//!     let pod = Object::new("Pod", "ns", "app");
//!     let found = ResultSlot::new();
//!
//!     let result = cc
//!         .execute(
//!             &ReconcileContext::new(),
//!             vec![
//!                 Action::store_result(found.clone(), Action::get("Pod", pod.key())),
//!                 Action::call(move || {
//!                     if found.is(ResultStatus::NotFound) {
//!                         return Ok(Some(Action::create_with(
//!                             pod,
//!                             CreateOptions::new().annotate(),
//!                         )));
//!                     }
//!                     Ok(None)
//!                 }),
//!             ],
//!         )
//!         .await;
//!
//!     let response = result.into_response();
//!     // response.requeue drives the scheduler's next step
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod action;
pub mod annotator;
pub mod command;
pub mod error;
pub mod patch;
pub mod result;

// Re-export main types
pub use action::{Action, CallFn, CreateOptions};
pub use annotator::{set_controller_reference, Annotator, LAST_APPLIED_ANNOTATION};
pub use command::{ClientCommand, ClientCommandBuilder, CommandConfig, ReconcileContext};
pub use error::{Error, Result};
pub use patch::PatchChecker;
pub use result::{ExecResult, ReconcileResponse, ResultSlot, ResultStatus};
