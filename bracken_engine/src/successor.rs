// Successor resolution: what a matched symbol is replaced with.
//
// A `Successor` is a closed sum over the four replacement shapes: one
// symbol, an ordered list, an externally supplied function, or a weighted
// list of alternatives resolved recursively after one is picked. Resolution
// stamps every produced symbol with the generation it was produced in, which
// is what the engine's same-generation protection keys on.
//
// Stamping is shallow: a successor symbol that carries a pre-built branch
// keeps that branch's own stamps untouched. Branch contents get their stamps
// when rules rewrite them, not when their parent is produced.
//
// A function successor may return an empty list, which deletes the matched
// symbol; the function decided so with full context in hand. A declarative
// empty list is different: it is a structurally invalid rule, rejected as
// `MalformedRule` both at registration and, should one slip through, at
// resolution.

use crate::error::{malformed, LSystemError};
use crate::symbol::{Symbol, SymbolSequence};
use crate::weighted::sample_weighted;
use bracken_prng::GrowthRng;
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::sync::Arc;

/// Replacement symbols produced by one rule application. Most successors
/// produce a handful of symbols, so they stay inline.
pub type Replacement<P> = SmallVec<[Symbol<P>; 4]>;

/// What a function successor returns: one symbol or a list. An empty list
/// deletes the matched symbol.
pub enum Expansion<P> {
    One(Symbol<P>),
    Many(SymbolSequence<P>),
}

impl<P> From<Symbol<P>> for Expansion<P> {
    fn from(symbol: Symbol<P>) -> Self {
        Self::One(symbol)
    }
}

impl<P> From<SymbolSequence<P>> for Expansion<P> {
    fn from(sequence: SymbolSequence<P>) -> Self {
        Self::Many(sequence)
    }
}

/// The cursor a function successor is invoked with. Unlike the condition
/// cursor this one has no generation field: successors describe structure,
/// and the engine owns the stamping.
pub struct ExpandContext<'a, P> {
    /// The matched symbol being replaced.
    pub symbol: &'a Symbol<P>,
    /// Its index within `sequence`.
    pub index: usize,
    /// The sequence level containing the match, in its current,
    /// partially-rewritten state.
    pub sequence: &'a [Symbol<P>],
    /// The symbol owning this sequence level, when the level is a branch.
    pub parent: Option<&'a Symbol<P>>,
}

/// Externally supplied replacement function.
pub type SuccessorFn<P> = Arc<dyn Fn(&ExpandContext<'_, P>) -> Expansion<P> + Send + Sync>;

/// One alternative of a stochastic successor.
#[derive(Debug, Clone)]
pub struct StochasticEntry<P = ()> {
    pub successor: Successor<P>,
    /// Relative weight; alternatives need not sum to 1.
    pub probability: f64,
}

/// What a rule replaces its matched symbol with.
#[derive(Clone)]
pub enum Successor<P = ()> {
    /// Replace with exactly one symbol.
    Single(Symbol<P>),
    /// Replace with an ordered list of symbols. Must be non-empty; an empty
    /// declarative successor is a malformed rule.
    Sequence(SymbolSequence<P>),
    /// Ask an external function, handing it the cursor.
    Function(SuccessorFn<P>),
    /// Pick one weighted alternative, then resolve it recursively; the
    /// picked successor may itself be a function or another stochastic list.
    Stochastic(Vec<StochasticEntry<P>>),
}

impl<P> Successor<P> {
    /// Wrap a replacement function.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ExpandContext<'_, P>) -> Expansion<P> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Build a stochastic successor from `(successor, probability)` pairs.
    pub fn stochastic(entries: impl IntoIterator<Item = (Successor<P>, f64)>) -> Self {
        Self::Stochastic(
            entries
                .into_iter()
                .map(|(successor, probability)| StochasticEntry {
                    successor,
                    probability,
                })
                .collect(),
        )
    }

    /// True when the successor is expressible as plain data: no functions at
    /// any nesting depth. Only declarative successors survive definition
    /// export.
    pub fn is_declarative(&self) -> bool {
        match self {
            Self::Single(_) | Self::Sequence(_) => true,
            Self::Function(_) => false,
            Self::Stochastic(entries) => entries.iter().all(|e| e.successor.is_declarative()),
        }
    }
}

// Manual impl: the function variant holds a bare function value.
impl<P> fmt::Debug for Successor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single(..)"),
            Self::Sequence(symbols) => write!(f, "Sequence({} symbols)", symbols.len()),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Stochastic(entries) => write!(f, "Stochastic({} entries)", entries.len()),
        }
    }
}

fn stamped<P>(mut symbol: Symbol<P>, generation: u32) -> Symbol<P> {
    symbol.last_touched = Some(generation);
    symbol
}

/// Resolve a successor at a cursor into the stamped replacement symbols.
///
/// `rule_id` only feeds error reporting. The RNG is consulted exactly once
/// per stochastic layer encountered.
pub(crate) fn resolve_successor<P: Clone>(
    successor: &Successor<P>,
    rule_id: &str,
    ctx: &ExpandContext<'_, P>,
    generation: u32,
    rng: &mut GrowthRng,
) -> Result<Replacement<P>, LSystemError> {
    match successor {
        Successor::Single(symbol) => Ok(smallvec![stamped(symbol.clone(), generation)]),
        Successor::Sequence(symbols) => {
            if symbols.is_empty() {
                return Err(malformed(rule_id, "successor resolves to no symbols"));
            }
            Ok(symbols
                .iter()
                .map(|s| stamped(s.clone(), generation))
                .collect())
        }
        Successor::Function(f) => Ok(match f(ctx) {
            Expansion::One(symbol) => smallvec![stamped(symbol, generation)],
            Expansion::Many(symbols) => symbols
                .into_iter()
                .map(|s| stamped(s, generation))
                .collect(),
        }),
        Successor::Stochastic(entries) => {
            let Some(picked) = sample_weighted(entries, |e| e.probability, rng.next_f64()) else {
                return Err(malformed(
                    rule_id,
                    "stochastic successor has no selectable entry",
                ));
            };
            resolve_successor(&picked.successor, rule_id, ctx, generation, rng)
        }
    }
}
