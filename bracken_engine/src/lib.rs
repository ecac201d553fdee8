// bracken_engine: parametric L-system rewriting engine.
//
// An iterative term-rewriting grammar: a sequence of symbols is transformed
// by production rules, one generation at a time, until a requested
// generation is reached. Symbols carry open parameter payloads, may branch
// into nested sub-sequences, and are replaced, according to conditions over
// their local context, by fixed successors, weighted-random alternatives,
// or externally supplied functions. The crate is the whole engine; turtle
// interpretation, rendering, and persistence are callers' business.
//
// Module overview:
// - `lsystem.rs`:    The iteration engine: rule set, generation replay, cache orchestration.
// - `condition.rs`:  Boolean-expression language deciding where rules fire.
// - `successor.rs`:  Replacement resolution + generation stamping.
// - `rule.rs`:       Rule = id + condition + successor (+ override flag), with validation.
// - `weighted.rs`:   Cumulative-distribution weighted selection.
// - `cache.rs`:      Per-generation memo table scoped to a rule-set identity.
// - `definition.rs`: Plain-data snapshots (export/import) of initial sequence + rules.
// - `symbol.rs`:     Symbol / SymbolSequence, the recursive sequence-tree type.
// - `error.rs`:      LSystemError, the ways an engine call can fail.
// - `prng`:          Re-exported `bracken_prng` (xoshiro256++ with SplitMix64 seeding).
//
// Control flows one direction per rewrite: the engine asks the condition
// evaluator whether a rule fires, the successor resolver what it produces,
// and the weighted selector which stochastic alternative to take. The cache
// is consulted and filled only by the engine.
//
// **Critical constraint: determinism under a seed.** All randomness comes
// from a seeded xoshiro256++ PRNG owned by the engine instance. A seeded
// engine replays stochastic rewrites exactly; only an unseeded engine
// (entropy-seeded) varies run to run.

pub mod cache;
pub mod condition;
pub mod definition;
pub mod error;
pub mod lsystem;
pub use bracken_prng as prng;
pub mod rule;
pub mod successor;
pub mod symbol;
pub mod weighted;
