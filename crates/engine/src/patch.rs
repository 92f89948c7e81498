//! Semantic patch detection: decides whether a candidate object differs
//! from the live state in any field this engine actually manages.
//!
//! The comparison is a three-way diff: previous-applied snapshot (read from
//! the live object's last-applied annotation) vs. live fields vs. desired
//! fields. Metadata noise the store injects (resource versions, uids,
//! foreign annotations it defaults in) never counts as drift, which is what
//! keeps reconciliation from updating an object every cycle.

use serde_json::Value;

use crate::annotator::Annotator;
use crate::error::Result;
use converge_store::Object;

/// Decides whether an update is semantically necessary.
#[derive(Debug, Clone, Default)]
pub struct PatchChecker {
    annotator: Annotator,
}

impl PatchChecker {
    /// Create a patch checker reading snapshots stamped by `annotator`.
    pub fn new(annotator: Annotator) -> Self {
        Self { annotator }
    }

    /// Whether `desired` would change anything `current` does not already
    /// have.
    ///
    /// Returns `false` when every field `desired` would write already equals
    /// the live value and nothing previously applied has been dropped while
    /// still live. Pure and idempotent: the same pair always yields the same
    /// answer. A malformed snapshot annotation is an error, never a silent
    /// "update everything".
    pub fn check_patch(&self, current: &Object, desired: &Object) -> Result<bool> {
        let previous = self
            .annotator
            .last_applied(current)?
            .unwrap_or(Value::Null);
        let live = self.annotator.applied_fields(current)?;
        let next = self.annotator.applied_fields(desired)?;

        Ok(needs_update(&previous, &live, &next))
    }
}

/// Three-way recursive diff over JSON documents.
///
/// - Keys in `next`: drift iff the live value differs.
/// - Keys in `previous` but dropped from `next`: drift iff still live (we
///   put them there, the caller no longer wants them).
/// - Keys only in `live`: ignored — server-populated defaults are not ours
///   to fight.
fn needs_update(previous: &Value, live: &Value, next: &Value) -> bool {
    match (next, live) {
        (Value::Object(next_map), Value::Object(live_map)) => {
            for (key, next_value) in next_map {
                let live_value = live_map.get(key).unwrap_or(&Value::Null);
                let previous_value = previous.get(key).unwrap_or(&Value::Null);
                if needs_update(previous_value, live_value, next_value) {
                    return true;
                }
            }

            if let Value::Object(previous_map) = previous {
                for key in previous_map.keys() {
                    if !next_map.contains_key(key) && live_map.contains_key(key) {
                        return true;
                    }
                }
            }

            false
        }
        _ => next != live,
    }
}
