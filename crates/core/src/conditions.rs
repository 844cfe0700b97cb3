//! Condition tracking for BeaconSource status.
//!
//! A fixed, immutable [`ConditionSet`] names the conditions a resource tracks
//! plus the synthetic aggregate `Ready`. A [`ConditionManager`] borrows the
//! status condition list and applies marks; `Ready` is recomputed after every
//! mark and never set directly.

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_SINK_PROVIDED: &str = "SinkProvided";
pub const CONDITION_DEPLOYED: &str = "Deployed";
pub const CONDITION_EVENT_TYPES_PROVIDED: &str = "EventTypesProvided";

/// Conditions tracked for a BeaconSource. Constructed once, never mutated.
pub const SOURCE_CONDITIONS: ConditionSet = ConditionSet {
    ready: CONDITION_READY,
    dependents: &[
        CONDITION_SINK_PROVIDED,
        CONDITION_DEPLOYED,
        CONDITION_EVENT_TYPES_PROVIDED,
    ],
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionSeverity {
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ConditionSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    fn unknown(type_: &str) -> Self {
        Condition {
            type_: type_.to_string(),
            status: ConditionStatus::Unknown,
            severity: None,
            reason: None,
            message: None,
            last_transition_time: None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    /// Equality ignoring the transition timestamp; used to decide whether a
    /// mark is a no-op.
    fn same_as(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.severity == other.severity
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Immutable registry of tracked condition types for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct ConditionSet {
    pub ready: &'static str,
    pub dependents: &'static [&'static str],
}

/// Borrowing view over a status condition list, scoped to a [`ConditionSet`].
pub struct ConditionManager<'a> {
    set: &'a ConditionSet,
    conditions: &'a mut Vec<Condition>,
}

impl<'a> ConditionManager<'a> {
    pub fn new(set: &'a ConditionSet, conditions: &'a mut Vec<Condition>) -> Self {
        Self { set, conditions }
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Set every tracked condition that is absent to Unknown. Idempotent and
    /// never downgrades a condition that was already marked.
    pub fn initialize(&mut self) {
        for type_ in self.set.dependents {
            if self.get(type_).is_none() {
                self.store(Condition::unknown(type_));
            }
        }
        self.recompute_ready();
    }

    pub fn mark_true(&mut self, type_: &str) {
        self.set_condition(Condition {
            status: ConditionStatus::True,
            ..Condition::unknown(type_)
        });
    }

    pub fn mark_false(&mut self, type_: &str, reason: &str, message: &str) {
        self.set_condition(Condition {
            status: ConditionStatus::False,
            severity: Some(ConditionSeverity::Error),
            reason: non_empty(reason),
            message: non_empty(message),
            ..Condition::unknown(type_)
        });
    }

    pub fn mark_unknown(&mut self, type_: &str, reason: &str, message: &str) {
        self.set_condition(Condition {
            status: ConditionStatus::Unknown,
            severity: Some(ConditionSeverity::Error),
            reason: non_empty(reason),
            message: non_empty(message),
            ..Condition::unknown(type_)
        });
    }

    /// Set one dependent condition verbatim, then recompute the aggregate.
    /// The aggregate itself cannot be set through here.
    pub fn set_condition(&mut self, condition: Condition) {
        if condition.type_ == self.set.ready {
            return;
        }
        self.store(condition);
        self.recompute_ready();
    }

    /// True iff every tracked condition is True. Always re-derived from the
    /// dependents, never read back from the stored aggregate.
    pub fn is_ready(&self) -> bool {
        self.set
            .dependents
            .iter()
            .all(|t| self.get(t).map(Condition::is_true).unwrap_or(false))
    }

    /// Re-derive `Ready` from the dependents: False wins over Unknown, and the
    /// first non-True dependent lends its reason and message.
    fn recompute_ready(&mut self) {
        let blocking = |status: ConditionStatus| {
            self.set
                .dependents
                .iter()
                .filter_map(|t| self.get(t))
                .find(|c| c.status == status)
                .cloned()
        };
        let ready = if let Some(c) = blocking(ConditionStatus::False) {
            Condition {
                status: ConditionStatus::False,
                severity: Some(ConditionSeverity::Error),
                reason: c.reason.clone(),
                message: c.message.clone(),
                ..Condition::unknown(self.set.ready)
            }
        } else if !self.is_ready() {
            let c = blocking(ConditionStatus::Unknown);
            Condition {
                status: ConditionStatus::Unknown,
                severity: Some(ConditionSeverity::Error),
                reason: c.as_ref().and_then(|c| c.reason.clone()),
                message: c.as_ref().and_then(|c| c.message.clone()),
                ..Condition::unknown(self.set.ready)
            }
        } else {
            Condition {
                status: ConditionStatus::True,
                ..Condition::unknown(self.set.ready)
            }
        };
        self.store(ready);
    }

    /// Insert or replace by type, keeping the list sorted for deterministic
    /// serialization. The transition timestamp only moves when the tri-state
    /// value actually changes.
    fn store(&mut self, mut condition: Condition) {
        if let Some(idx) = self.conditions.iter().position(|c| c.type_ == condition.type_) {
            let existing = &self.conditions[idx];
            if existing.same_as(&condition) {
                return;
            }
            condition.last_transition_time = if existing.status == condition.status {
                existing.last_transition_time.clone()
            } else {
                Some(now_rfc3339())
            };
            self.conditions[idx] = condition;
        } else {
            condition.last_transition_time = Some(now_rfc3339());
            self.conditions.push(condition);
            self.conditions.sort_by(|a, b| a.type_.cmp(&b.type_));
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
