//! Actions: polymorphic units of work executed by the command runner.
//!
//! Actions are stateless value descriptions built fresh per reconciliation
//! invocation; they hold no cross-invocation state. Dynamic branching goes
//! through [`Action::call`], a pure decision thunk over results captured in
//! [`ResultSlot`]s.

use std::fmt;

use crate::error::Result;
use crate::result::ResultSlot;
use converge_store::{Condition, Object, ObjectKey};

/// Decision thunk evaluated at its position in the pipeline. Returning an
/// action splices it in for immediate execution; `None` proceeds to the next
/// statically-listed action.
pub type CallFn = Box<dyn FnOnce() -> Result<Option<Action>> + Send>;

/// Pre-write hooks applied to an object before a create.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Stamp the last-applied snapshot annotation before writing.
    pub annotate: bool,
    /// Stamp a controller owner reference linking to this owner.
    pub owner: Option<Object>,
}

impl CreateOptions {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the last-applied snapshot annotation.
    #[must_use]
    pub fn annotate(mut self) -> Self {
        self.annotate = true;
        self
    }

    /// Stamp a controller owner reference to `owner`.
    #[must_use]
    pub fn owned_by(mut self, owner: &Object) -> Self {
        self.owner = Some(owner.clone());
        self
    }
}

/// A unit of work against the store.
pub enum Action {
    /// Fetch an object by kind and namespaced key.
    Get { kind: String, key: ObjectKey },
    /// Submit a new object, optionally pre-processed by the create hooks.
    Create {
        object: Object,
        options: CreateOptions,
    },
    /// Full replacement of an existing object. Callers decide *whether* to
    /// update via the patch checker; no diffing happens here.
    Update { object: Object },
    /// Remove an object.
    Delete { object: Object },
    /// Evaluate a decision thunk that may splice in another action.
    Call { decide: CallFn },
    /// Execute the inner action and copy its result into the slot.
    StoreResult {
        slot: ResultSlot,
        inner: Box<Action>,
    },
    /// Merge a condition into the owner's status and write the status
    /// subresource only if the merge changed anything.
    UpdateStatusCondition { object: Object, condition: Condition },
}

impl Action {
    /// Fetch an object.
    pub fn get(kind: impl Into<String>, key: ObjectKey) -> Self {
        Self::Get {
            kind: kind.into(),
            key,
        }
    }

    /// Create an object with no pre-write hooks.
    pub fn create(object: Object) -> Self {
        Self::Create {
            object,
            options: CreateOptions::new(),
        }
    }

    /// Create an object with pre-write hooks.
    pub fn create_with(object: Object, options: CreateOptions) -> Self {
        Self::Create { object, options }
    }

    /// Replace an existing object.
    pub fn update(object: Object) -> Self {
        Self::Update { object }
    }

    /// Delete an object.
    pub fn delete(object: Object) -> Self {
        Self::Delete { object }
    }

    /// Evaluate a decision thunk.
    pub fn call<F>(decide: F) -> Self
    where
        F: FnOnce() -> Result<Option<Action>> + Send + 'static,
    {
        Self::Call {
            decide: Box::new(decide),
        }
    }

    /// Capture the inner action's result into the slot. Halting behavior is
    /// exactly the inner action's.
    pub fn store_result(slot: ResultSlot, inner: Action) -> Self {
        Self::StoreResult {
            slot,
            inner: Box::new(inner),
        }
    }

    /// Merge a condition and write the status subresource if it changed.
    pub fn update_status_condition(object: Object, condition: Condition) -> Self {
        Self::UpdateStatusCondition { object, condition }
    }

    /// Get a description of the action, for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Get { kind, key } => format!("get {kind} {key}"),
            Self::Create { object, options } => {
                let hooks = match (options.annotate, options.owner.is_some()) {
                    (true, true) => " (annotate, owned)",
                    (true, false) => " (annotate)",
                    (false, true) => " (owned)",
                    (false, false) => "",
                };
                format!("create {} {}{hooks}", object.kind, object.key())
            }
            Self::Update { object } => format!("update {} {}", object.kind, object.key()),
            Self::Delete { object } => format!("delete {} {}", object.kind, object.key()),
            Self::Call { .. } => "call".to_string(),
            Self::StoreResult { inner, .. } => format!("store result of [{}]", inner.description()),
            Self::UpdateStatusCondition { object, condition } => format!(
                "update status condition {} on {} {}",
                condition.condition_type,
                object.kind,
                object.key()
            ),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.description())
    }
}
