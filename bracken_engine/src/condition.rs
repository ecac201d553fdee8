// Condition evaluation: a small boolean-expression language deciding whether
// a production rule fires at a given cursor position.
//
// A `Condition` is a closed expression tree; `evaluate` walks it with
// exhaustive matching, so adding a variant is a compile-time-checked change
// everywhere it matters. The cursor (`EvalContext`) carries the symbol under
// consideration, its index, the whole enclosing sequence level, the current
// generation, and the branch-owning parent symbol if the level is a branch.
//
// Evaluation never fails. Out-of-bounds context lookups and empty
// neighborhoods resolve to `false` by policy, which removes the entire class
// of boundary errors from rule authoring: a condition that looks two symbols
// back simply does not match at index 0 or 1.
//
// Positional variants re-anchor the cursor before recursing: `Before`,
// `After` and `RelativeTo { .. }` evaluate their sub-condition against a
// neighboring symbol with `index` moved accordingly, while `sequence`,
// `generation` and `parent` stay fixed. This lets nested positional
// conditions compose ("the symbol after me has an `A` before it").
//
// See also: `rule.rs` for how conditions attach to rules, `lsystem.rs` for
// the call site that builds cursors during a generation pass.

use crate::symbol::Symbol;
use std::fmt;
use std::sync::Arc;

/// Externally supplied predicate, the escape hatch for conditions that the
/// declarative variants cannot express. Must be `Send + Sync` so an engine
/// holding it can move across threads.
pub type ConditionPredicate<P> = Arc<dyn Fn(&EvalContext<'_, P>) -> bool + Send + Sync>;

/// The cursor a condition is evaluated against.
pub struct EvalContext<'a, P> {
    /// Symbol under consideration.
    pub symbol: &'a Symbol<P>,
    /// Its index within `sequence`.
    pub index: usize,
    /// The full sequence level containing `symbol`, in its current,
    /// partially-rewritten state.
    pub sequence: &'a [Symbol<P>],
    /// Generation currently being computed.
    pub generation: u32,
    /// The symbol owning this sequence level, when the level is a branch.
    pub parent: Option<&'a Symbol<P>>,
}

impl<'a, P> EvalContext<'a, P> {
    // Caller guarantees `index` is in bounds for `self.sequence`.
    fn reanchor(&self, index: usize) -> EvalContext<'a, P> {
        EvalContext {
            symbol: &self.sequence[index],
            index,
            sequence: self.sequence,
            generation: self.generation,
            parent: self.parent,
        }
    }
}

/// A boolean expression over a cursor position.
#[derive(Clone)]
pub enum Condition<P = ()> {
    /// True iff the cursor symbol's label is one of these labels.
    MatchLabel(Vec<String>),
    /// True iff the predicate says so.
    MatchCallback(ConditionPredicate<P>),
    /// Logical negation.
    Not(Box<Condition<P>>),
    /// True iff every sub-condition holds; vacuously true when empty.
    And(Vec<Condition<P>>),
    /// True iff any sub-condition holds; vacuously false when empty.
    Or(Vec<Condition<P>>),
    /// True iff any symbol strictly after the cursor satisfies the
    /// sub-condition. The last index has no such symbols and yields false.
    Before(Box<Condition<P>>),
    /// True iff every symbol strictly after the cursor satisfies the
    /// sub-condition, and at least one exists.
    BeforeAll(Box<Condition<P>>),
    /// True iff any symbol strictly before the cursor satisfies the
    /// sub-condition. Index 0 has no such symbols and yields false.
    After(Box<Condition<P>>),
    /// True iff every symbol strictly before the cursor satisfies the
    /// sub-condition, and at least one exists.
    AfterAll(Box<Condition<P>>),
    /// True iff the symbol at `index + offset` exists and satisfies the
    /// sub-condition; out-of-bounds offsets yield false, never an error.
    RelativeTo {
        offset: isize,
        condition: Box<Condition<P>>,
    },
}

impl<P> Condition<P> {
    /// Match a single label.
    pub fn match_label(label: impl Into<String>) -> Self {
        Self::MatchLabel(vec![label.into()])
    }

    /// Match any label out of a set.
    pub fn match_any_label<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MatchLabel(labels.into_iter().map(Into::into).collect())
    }

    /// Wrap an arbitrary predicate over the cursor.
    pub fn callback<F>(predicate: F) -> Self
    where
        F: Fn(&EvalContext<'_, P>) -> bool + Send + Sync + 'static,
    {
        Self::MatchCallback(Arc::new(predicate))
    }

    pub fn not(condition: Condition<P>) -> Self {
        Self::Not(Box::new(condition))
    }

    pub fn and(conditions: impl IntoIterator<Item = Condition<P>>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    pub fn or(conditions: impl IntoIterator<Item = Condition<P>>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    pub fn before(condition: Condition<P>) -> Self {
        Self::Before(Box::new(condition))
    }

    pub fn before_all(condition: Condition<P>) -> Self {
        Self::BeforeAll(Box::new(condition))
    }

    pub fn after(condition: Condition<P>) -> Self {
        Self::After(Box::new(condition))
    }

    pub fn after_all(condition: Condition<P>) -> Self {
        Self::AfterAll(Box::new(condition))
    }

    pub fn relative_to(offset: isize, condition: Condition<P>) -> Self {
        Self::RelativeTo {
            offset,
            condition: Box::new(condition),
        }
    }

    /// Decide whether this condition holds at the cursor.
    pub fn evaluate(&self, ctx: &EvalContext<'_, P>) -> bool {
        match self {
            Self::MatchLabel(labels) => labels.iter().any(|l| *l == ctx.symbol.label),
            Self::MatchCallback(predicate) => predicate(ctx),
            Self::Not(condition) => !condition.evaluate(ctx),
            Self::And(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Or(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Before(condition) => (ctx.index + 1..ctx.sequence.len())
                .any(|i| condition.evaluate(&ctx.reanchor(i))),
            Self::BeforeAll(condition) => {
                if ctx.index + 1 >= ctx.sequence.len() {
                    return false;
                }
                (ctx.index + 1..ctx.sequence.len()).all(|i| condition.evaluate(&ctx.reanchor(i)))
            }
            Self::After(condition) => {
                (0..ctx.index).any(|i| condition.evaluate(&ctx.reanchor(i)))
            }
            Self::AfterAll(condition) => {
                if ctx.index == 0 {
                    return false;
                }
                (0..ctx.index).all(|i| condition.evaluate(&ctx.reanchor(i)))
            }
            Self::RelativeTo { offset, condition } => {
                let Some(target) = ctx.index.checked_add_signed(*offset) else {
                    return false;
                };
                if target >= ctx.sequence.len() {
                    return false;
                }
                condition.evaluate(&ctx.reanchor(target))
            }
        }
    }

    /// True when the whole tree is expressible as plain data, i.e. contains
    /// no callback. Only declarative conditions survive definition export.
    pub fn is_declarative(&self) -> bool {
        match self {
            Self::MatchLabel(_) => true,
            Self::MatchCallback(_) => false,
            Self::Not(c)
            | Self::Before(c)
            | Self::BeforeAll(c)
            | Self::After(c)
            | Self::AfterAll(c)
            | Self::RelativeTo { condition: c, .. } => c.is_declarative(),
            Self::And(cs) | Self::Or(cs) => cs.iter().all(Condition::is_declarative),
        }
    }
}

// Manual impl: the callback variant holds a bare function value.
impl<P> fmt::Debug for Condition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchLabel(labels) => f.debug_tuple("MatchLabel").field(labels).finish(),
            Self::MatchCallback(_) => f.write_str("MatchCallback(..)"),
            Self::Not(c) => f.debug_tuple("Not").field(c).finish(),
            Self::And(cs) => f.debug_tuple("And").field(cs).finish(),
            Self::Or(cs) => f.debug_tuple("Or").field(cs).finish(),
            Self::Before(c) => f.debug_tuple("Before").field(c).finish(),
            Self::BeforeAll(c) => f.debug_tuple("BeforeAll").field(c).finish(),
            Self::After(c) => f.debug_tuple("After").field(c).finish(),
            Self::AfterAll(c) => f.debug_tuple("AfterAll").field(c).finish(),
            Self::RelativeTo { offset, condition } => f
                .debug_struct("RelativeTo")
                .field("offset", offset)
                .field("condition", condition)
                .finish(),
        }
    }
}
