// Production rules: when a symbol is replaced, and with what.
//
// A rule couples a condition to a successor under a unique id. Ids key the
// engine's rule set; the order rules were registered in is the order they
// are applied in within one generation pass, which matters whenever two
// rules could match overlapping symbols.
//
// `allow_override` opts a rule out of same-generation protection: normally a
// symbol produced while computing generation g is skipped by every later
// rule of that same pass, but an overriding rule rewrites it anyway. This is
// how a low-priority cleanup rule can post-process what an earlier rule just
// emitted.
//
// Structural validation happens at registration, not at rewrite time: a rule
// that cannot possibly resolve (empty declarative successor, weightless
// stochastic list) is rejected as `MalformedRule` before it enters the rule
// set, so a generation pass only ever sees rules that were well-formed when
// added.

use crate::condition::Condition;
use crate::error::{malformed, LSystemError};
use crate::successor::Successor;

/// A named production rule.
#[derive(Debug, Clone)]
pub struct Rule<P = ()> {
    /// Unique key within one engine's rule set.
    pub id: String,
    /// When the rule fires.
    pub condition: Condition<P>,
    /// What the matched symbol becomes.
    pub successor: Successor<P>,
    /// Rewrite symbols already produced earlier in the same generation pass.
    pub allow_override: bool,
}

impl<P> Rule<P> {
    pub fn new(
        id: impl Into<String>,
        condition: Condition<P>,
        successor: Successor<P>,
    ) -> Self {
        Self {
            id: id.into(),
            condition,
            successor,
            allow_override: false,
        }
    }

    /// The classic non-contextual rule: fires on every symbol with this
    /// label, using the label itself as the rule id.
    pub fn for_label(label: impl Into<String>, successor: Successor<P>) -> Self {
        let label = label.into();
        Self::new(label.clone(), Condition::match_label(label), successor)
    }

    pub fn with_allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// True when both sides of the rule are plain data: no callback
    /// condition, no function successor anywhere. Only declarative rules
    /// survive definition export.
    pub fn is_declarative(&self) -> bool {
        self.condition.is_declarative() && self.successor.is_declarative()
    }

    /// Reject rules that cannot possibly resolve. Called on every path that
    /// admits a rule into an engine.
    pub fn validate(&self) -> Result<(), LSystemError> {
        validate_successor(&self.successor, &self.id)
    }
}

fn validate_successor<P>(successor: &Successor<P>, rule_id: &str) -> Result<(), LSystemError> {
    match successor {
        Successor::Single(_) | Successor::Function(_) => Ok(()),
        Successor::Sequence(symbols) => {
            if symbols.is_empty() {
                return Err(malformed(rule_id, "successor resolves to no symbols"));
            }
            Ok(())
        }
        Successor::Stochastic(entries) => {
            if entries.is_empty() {
                return Err(malformed(rule_id, "stochastic successor has no entries"));
            }
            for entry in entries {
                if !entry.probability.is_finite() || entry.probability < 0.0 {
                    return Err(malformed(
                        rule_id,
                        "stochastic probability must be finite and non-negative",
                    ));
                }
                validate_successor(&entry.successor, rule_id)?;
            }
            let total: f64 = entries.iter().map(|e| e.probability).sum();
            if total <= 0.0 {
                return Err(malformed(rule_id, "stochastic weights sum to zero"));
            }
            Ok(())
        }
    }
}
