// Error surface of the engine.
//
// Every failure here is a local, synchronous configuration problem reported
// at the call that triggered it. Nothing is retried internally, and every
// mutating operation that can fail leaves the engine in its prior state.
// Condition evaluation and out-of-bounds context lookups never produce
// errors at all; they resolve to `false` by policy (see `condition.rs`).

use thiserror::Error;

/// Errors produced by `LSystem` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LSystemError {
    /// `remove_rule` was called with an id no registered rule carries.
    #[error("no rule with id `{id}` is registered")]
    RuleNotFound { id: String },

    /// A rule's successor is structurally unusable (empty successor list,
    /// empty stochastic table, weights that cannot select anything).
    /// Treated as a configuration bug, not a runtime condition to recover
    /// from.
    #[error("rule `{id}` is malformed: {reason}")]
    MalformedRule { id: String, reason: String },

    /// An imported definition failed validation. The engine keeps its prior
    /// initial sequence and rule set.
    #[error("invalid system definition: {reason}")]
    InvalidDefinition { reason: String },

    /// A rule holds a function-valued condition or successor, which has no
    /// plain-data representation. The exporter rejects the whole snapshot
    /// rather than silently dropping the rule.
    #[error("rule `{id}` contains a function-valued condition or successor and cannot be exported")]
    UnexportableRule { id: String },
}

pub(crate) fn malformed(id: &str, reason: impl Into<String>) -> LSystemError {
    LSystemError::MalformedRule {
        id: id.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn invalid(reason: impl Into<String>) -> LSystemError {
    LSystemError::InvalidDefinition {
        reason: reason.into(),
    }
}
