//! The result vocabulary the engine communicates with: per-action execution
//! results, the halt rule, and slots for passing results between actions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use converge_store::Object;

/// Status of a single action execution.
///
/// `Continue` and `NotFound` never stop the runner; all other statuses stop
/// it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// Non-terminal: proceed to the next action.
    Continue,
    /// Non-terminal, informational: the targeted object does not exist.
    NotFound,
    /// Terminal success: caller should re-invoke reconciliation.
    Requeue,
    /// Terminal success with a suggested re-invocation delay.
    RequeueAfter,
    /// Terminal failure carrying a cause.
    Error,
}

impl ResultStatus {
    /// Whether this status stops the runner.
    pub fn halts(&self) -> bool {
        matches!(self, Self::Requeue | Self::RequeueAfter | Self::Error)
    }
}

/// Result of executing one action.
///
/// Produced fresh by every action invocation and never persisted beyond a
/// single runner invocation. `err` is set iff `status` is
/// [`ResultStatus::Error`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecResult {
    pub status: ResultStatus,
    pub err: Option<Error>,
    /// The object acted upon, if any.
    pub value: Option<Object>,
    /// Suggested delay, set for [`ResultStatus::RequeueAfter`].
    pub requeue_delay: Option<Duration>,
}

impl ExecResult {
    /// Non-terminal success: proceed to the next action.
    pub fn cont() -> Self {
        Self {
            status: ResultStatus::Continue,
            err: None,
            value: None,
            requeue_delay: None,
        }
    }

    /// The targeted object does not exist; the pipeline continues.
    pub fn not_found() -> Self {
        Self {
            status: ResultStatus::NotFound,
            ..Self::cont()
        }
    }

    /// Terminal success: re-invoke soon.
    pub fn requeue() -> Self {
        Self {
            status: ResultStatus::Requeue,
            ..Self::cont()
        }
    }

    /// Terminal success: re-invoke after the given delay.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            status: ResultStatus::RequeueAfter,
            requeue_delay: Some(delay),
            ..Self::cont()
        }
    }

    /// Terminal failure carrying its cause.
    pub fn error(err: Error) -> Self {
        Self {
            status: ResultStatus::Error,
            err: Some(err),
            ..Self::cont()
        }
    }

    /// Attach the object acted upon.
    #[must_use]
    pub fn with_value(mut self, value: Object) -> Self {
        self.value = Some(value);
        self
    }

    /// Branch predicate on the status.
    pub fn is(&self, status: ResultStatus) -> bool {
        self.status == status
    }

    /// Whether this result stops the runner.
    pub fn halts(&self) -> bool {
        self.status.halts()
    }

    /// Map to a `Result` for `?`-style propagation: `Err` iff the status is
    /// [`ResultStatus::Error`].
    pub fn into_result(self) -> Result<Self> {
        match (&self.status, self.err.clone()) {
            (ResultStatus::Error, Some(err)) => Err(err),
            (ResultStatus::Error, None) => Err(Error::decision("error result without a cause")),
            _ => Ok(self),
        }
    }

    /// Map a terminal result to the scheduler-facing response.
    pub fn into_response(self) -> ReconcileResponse {
        match self.status {
            ResultStatus::Continue | ResultStatus::NotFound => ReconcileResponse::done(),
            ResultStatus::Requeue => ReconcileResponse::requeue(),
            ResultStatus::RequeueAfter => match self.requeue_delay {
                Some(delay) => ReconcileResponse::requeue_after(delay),
                None => ReconcileResponse::requeue(),
            },
            // The scheduler applies its own backoff; the cause travels via
            // `into_result`.
            ResultStatus::Error => ReconcileResponse::requeue(),
        }
    }
}

/// What the external scheduler should do after one reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileResponse {
    pub requeue: bool,
    pub requeue_after: Option<Duration>,
}

impl ReconcileResponse {
    /// Nothing further needed this cycle.
    pub fn done() -> Self {
        Self::default()
    }

    /// Re-invoke soon.
    pub fn requeue() -> Self {
        Self {
            requeue: true,
            requeue_after: None,
        }
    }

    /// Re-invoke after a delay.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: true,
            requeue_after: Some(delay),
        }
    }
}

/// A caller-visible slot capturing one action's [`ExecResult`] for later
/// `Call` branches to read.
///
/// Slots are created fresh per reconciliation invocation and shared only
/// between the actions of that invocation; there is no ambient state.
#[derive(Clone, Default)]
pub struct ResultSlot {
    inner: Arc<Mutex<Option<ExecResult>>>,
}

impl ResultSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result, replacing any previous one.
    pub fn set(&self, result: ExecResult) {
        match self.inner.lock() {
            Ok(mut guard) => *guard = Some(result),
            Err(poisoned) => *poisoned.into_inner() = Some(result),
        }
    }

    /// The captured result, if any.
    pub fn get(&self) -> Option<ExecResult> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Branch predicate: whether the captured result has the given status.
    /// An empty slot matches nothing.
    pub fn is(&self, status: ResultStatus) -> bool {
        self.get().map(|r| r.is(status)).unwrap_or(false)
    }

    /// The object captured with the result, if any.
    pub fn value(&self) -> Option<Object> {
        self.get().and_then(|r| r.value)
    }
}
