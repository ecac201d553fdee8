// Core sequence types shared across the engine.
//
// A `Symbol` is the atomic unit of an L-system string: an opaque label, an
// optional parameter payload, an optional nested branch, and the generation
// stamp of the rule application that produced it. A `SymbolSequence` is an
// ordered list of symbols; because any symbol may own a `branch`
// sub-sequence, a sequence is really a tree that nests downward only.
// Branches are owned, never shared, so cycles are unconstructible.
//
// The parameter payload `P` is a generic the engine never inspects: systems
// that need per-symbol data (age, width, energy) pick their own `P`, systems
// that don't use the `()` default. All types derive serde so definitions and
// caller-side snapshots serialize with any serde format.
//
// `last_touched` is the engine's same-generation protection: a symbol
// produced while computing generation `g` carries `Some(g)` and is skipped
// by every later rule of that same generation pass unless the rule opts out
// (see `lsystem.rs`). Symbols of the initial sequence carry `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered run of symbols at one nesting level.
///
/// Insertion order is significant: it encodes left-to-right structure and is
/// preserved by every rewrite except where a rule's successor reorders its
/// own output.
pub type SymbolSequence<P = ()> = Vec<Symbol<P>>;

/// One symbol of an L-system sequence.
///
/// The optional fields carry no serde attributes: missing `Option` fields
/// already deserialize as `None`, and a field-level `default` would pin a
/// `P: Default` bound onto the derived `Deserialize` impl that generic
/// callers cannot meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol<P = ()> {
    /// Opaque label; the engine attaches no meaning to it.
    pub label: String,
    /// Open parameter payload, absent for plain symbols.
    pub params: Option<P>,
    /// Nested sub-sequence hung off this symbol, rewritten independently of
    /// the level that contains it.
    pub branch: Option<SymbolSequence<P>>,
    /// Generation in which a rule produced this symbol instance; `None` for
    /// symbols of the initial sequence.
    pub last_touched: Option<u32>,
}

impl<P> Symbol<P> {
    /// A plain symbol: no params, no branch, untouched.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            params: None,
            branch: None,
            last_touched: None,
        }
    }

    /// Attach a parameter payload.
    pub fn with_params(mut self, params: P) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach a branch sub-sequence.
    pub fn with_branch(mut self, branch: SymbolSequence<P>) -> Self {
        self.branch = Some(branch);
        self
    }
}

// Renders the label followed by the branch in square brackets, recursively:
// a symbol `B` carrying the branch `A C` displays as `B[AC]`. Params and
// generation stamps are not rendered.
impl<P> fmt::Display for Symbol<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        if let Some(branch) = &self.branch {
            f.write_str("[")?;
            for symbol in branch {
                write!(f, "{symbol}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Build a sequence from a string, one symbol per character.
///
/// Convenience for axioms and tests of classic single-letter systems
/// (`"ABAAB"`); it is not a grammar parser, so brackets and every other
/// character become ordinary labels.
pub fn label_sequence<P>(labels: &str) -> SymbolSequence<P> {
    labels.chars().map(|c| Symbol::new(c.to_string())).collect()
}

/// Render a sequence as its concatenated labels, branches bracketed.
///
/// The inverse view of `label_sequence` for single-letter systems, and the
/// notation used throughout the tests: `B[B[AC]ZCAB]`.
pub fn render_labels<P>(sequence: &[Symbol<P>]) -> String {
    use fmt::Write;
    let mut out = String::new();
    for symbol in sequence {
        // Writing into a String cannot fail.
        let _ = write!(out, "{symbol}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_sequence_builds_one_symbol_per_char() {
        let seq: SymbolSequence = label_sequence("ABC");
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[0].label, "A");
        assert_eq!(seq[2].label, "C");
        assert!(seq.iter().all(|s| s.last_touched.is_none()));
    }

    #[test]
    fn display_renders_branches_in_brackets() {
        let symbol: Symbol = Symbol::new("B")
            .with_branch(vec![Symbol::new("A"), Symbol::new("C")]);
        assert_eq!(symbol.to_string(), "B[AC]");

        let nested: Symbol = Symbol::new("B").with_branch(vec![
            Symbol::new("B").with_branch(label_sequence("AC")),
            Symbol::new("Z"),
        ]);
        assert_eq!(render_labels(&[nested]), "B[B[AC]Z]");
    }

    #[test]
    fn optional_fields_may_be_omitted_in_json() {
        // Hand-written definitions only need the label.
        let symbol: Symbol = serde_json::from_str(r#"{"label":"A"}"#).unwrap();
        assert_eq!(symbol, Symbol::new("A"));
    }

    #[test]
    fn params_roundtrip_through_serde() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Width {
            w: f32,
        }

        let symbol = Symbol::new("F").with_params(Width { w: 1.5 });
        let json = serde_json::to_string(&symbol).unwrap();
        let back: Symbol<Width> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, symbol);
    }

    #[test]
    fn branches_roundtrip_through_serde() {
        let symbol: Symbol = Symbol::new("B").with_branch(label_sequence("AC"));
        let json = serde_json::to_string(&symbol).unwrap();
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, symbol);
    }
}
