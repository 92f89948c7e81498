//! Status conditions and the merge rule that decides whether a status write
//! is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Truth value of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A typed, timestamped status fact attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a condition stamped with the current time.
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Desired-state equality: type, status, reason, and message.
    ///
    /// `last_transition_time` is derived, not desired state, so it is
    /// excluded here and refreshed only when the comparison fails.
    pub fn matches(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Ordered condition collection, at most one condition per type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the condition with the given type.
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.condition_type == condition_type)
    }

    /// Whether the condition with the given type is present and `True`.
    pub fn is_true(&self, condition_type: &str) -> bool {
        self.get(condition_type)
            .map(|c| c.status == ConditionStatus::True)
            .unwrap_or(false)
    }

    /// Merge a condition into the collection.
    ///
    /// Returns `false` without mutating anything when a condition with the
    /// same type, status, reason, and message is already present. Otherwise
    /// replaces or inserts the condition with a refreshed transition time
    /// and returns `true` — the signal that a status write is needed.
    pub fn set(&mut self, condition: Condition) -> bool {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => {
                if existing.matches(&condition) {
                    return false;
                }
                let mut condition = condition;
                condition.last_transition_time = Utc::now();
                *existing = condition;
                true
            }
            None => {
                let mut condition = condition;
                condition.last_transition_time = Utc::now();
                self.0.push(condition);
                true
            }
        }
    }

    /// Iterate over the conditions.
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
