// The iteration engine: owns the initial sequence, the rule set, and the
// per-generation cache, and replays rewriting up to any requested
// generation.
//
// Rewriting one generation works level by level. Branch sub-sequences are
// rewritten first, recursively, under the same generation number, with the
// branch-owning symbol handed down as the cursor's parent. Then every rule
// runs over the level in registration order, walking left to right and
// splicing each match's replacement in place, so later rules in the same
// pass see the new symbols at their final positions. Freshly produced
// symbols carry the current generation's stamp and are skipped by the rest
// of the pass unless a rule opts into overriding.
//
// Rules live in a plain vector. Registration order is application order,
// and re-registering an id replaces the rule in its existing slot, so a
// tweaked rule keeps its position in the pass.
//
// **Critical constraint: determinism under a seed.** A seeded engine with
// stochastic rules reproduces its output exactly, because all randomness
// flows through the engine's own `GrowthRng` and the weighted selector draws
// from it in a fixed order. An unseeded engine draws its seed from process
// entropy, so its stochastic output varies run to run.
//
// See also: `condition.rs` and `successor.rs` for the per-symbol decision
// and replacement machinery, `cache.rs` for how computed generations are
// remembered and invalidated.

use crate::cache::{IterationCache, RuleSetIdentity};
use crate::condition::EvalContext;
use crate::definition::SystemDefinition;
use crate::error::LSystemError;
use crate::rule::Rule;
use crate::successor::{resolve_successor, ExpandContext};
use crate::symbol::{Symbol, SymbolSequence};
use bracken_prng::GrowthRng;

/// Cache-bypass switches for [`LSystem::output_with`]. The default requests
/// fully cached behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Recompute the requested generation even when it is cached.
    pub force_recompute: bool,
    /// Ignore cached ancestors and replay from the initial sequence.
    pub force_recompute_ancestors: bool,
}

/// A parametric L-system: initial sequence plus production rules, rewritten
/// generation by generation on demand.
#[derive(Debug, Clone)]
pub struct LSystem<P = ()> {
    initial: SymbolSequence<P>,
    rules: Vec<Rule<P>>,
    cache: IterationCache<P>,
    revision: RuleSetIdentity,
    persist_cache: bool,
    rng: GrowthRng,
}

impl<P: Clone> LSystem<P> {
    /// An engine with no rules and an entropy-seeded RNG.
    pub fn new(initial: SymbolSequence<P>) -> Self {
        Self {
            initial,
            rules: Vec::new(),
            cache: IterationCache::new(),
            revision: 0,
            persist_cache: false,
            rng: GrowthRng::from_entropy(),
        }
    }

    /// Fix the RNG seed so stochastic rules replay identically.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = GrowthRng::new(seed);
        self
    }

    /// Keep cached generations across rule mutation. Queries may then return
    /// sequences computed against a superseded rule set until the caller
    /// clears the cache; opting in means accepting that staleness.
    pub fn persist_cache_across_rule_changes(mut self, persist: bool) -> Self {
        self.persist_cache = persist;
        self
    }

    /// Register a batch of rules, in order.
    pub fn with_rules(
        mut self,
        rules: impl IntoIterator<Item = Rule<P>>,
    ) -> Result<Self, LSystemError> {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(self)
    }

    /// The untouched generation-0 sequence.
    pub fn initial(&self) -> &SymbolSequence<P> {
        &self.initial
    }

    /// The active rules, in application order.
    pub fn rules(&self) -> &[Rule<P>] {
        &self.rules
    }

    /// The rule registered under `id`, if any.
    pub fn rule(&self, id: &str) -> Option<&Rule<P>> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Register a rule, validating it first. A rule with an already
    /// registered id replaces that rule in place, keeping its position in
    /// the application order.
    pub fn add_rule(&mut self, rule: Rule<P>) -> Result<(), LSystemError> {
        rule.validate()?;
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
        self.note_rule_mutation();
        Ok(())
    }

    /// Remove the rule registered under `id`.
    pub fn remove_rule(&mut self, id: &str) -> Result<(), LSystemError> {
        let Some(position) = self.rules.iter().position(|r| r.id == id) else {
            return Err(LSystemError::RuleNotFound { id: id.to_string() });
        };
        self.rules.remove(position);
        self.note_rule_mutation();
        Ok(())
    }

    /// Drop every cached generation.
    pub fn clean_cache(&mut self) {
        self.cache.clear();
    }

    /// The sequence at `generation`, computed or cached.
    pub fn output(&mut self, generation: u32) -> Result<&SymbolSequence<P>, LSystemError> {
        self.output_with(generation, OutputOptions::default())
    }

    /// [`LSystem::output`] with explicit cache-bypass switches.
    pub fn output_with(
        &mut self,
        generation: u32,
        options: OutputOptions,
    ) -> Result<&SymbolSequence<P>, LSystemError> {
        if generation == 0 {
            return Ok(&self.initial);
        }

        if !options.force_recompute {
            // Move a hit out and straight back in: hands back a reference to
            // the stored entry without cloning it.
            if let Some(sequence) = self.cache.take(self.revision, generation) {
                return Ok(self.cache.insert(self.revision, generation, sequence));
            }
        }

        self.replay_to(generation, options.force_recompute_ancestors)
    }

    /// A plain-data snapshot of the initial sequence and rule set. Fails
    /// with `UnexportableRule` if any rule carries a function-valued
    /// condition or successor.
    pub fn export_definition(&self) -> Result<SystemDefinition<P>, LSystemError> {
        SystemDefinition::from_parts(&self.initial, &self.rules)
    }

    /// Replace the initial sequence and rule set wholesale. The definition
    /// is checked in full before anything is touched, so a failed import
    /// leaves the engine exactly as it was. A successful import always
    /// invalidates the cache: prior generations were derived from a
    /// different initial sequence.
    pub fn import_definition(
        &mut self,
        definition: SystemDefinition<P>,
    ) -> Result<(), LSystemError> {
        let (initial, rules) = definition.into_parts()?;
        self.initial = initial;
        self.rules = rules;
        self.revision = self.revision.wrapping_add(1);
        self.cache.clear();
        Ok(())
    }

    fn note_rule_mutation(&mut self) {
        if !self.persist_cache {
            self.revision = self.revision.wrapping_add(1);
            self.cache.clear();
        }
    }

    // Replays rewriting up to `generation`, resuming from the deepest cached
    // ancestor unless `from_scratch`, and caches every generation computed
    // on the way.
    fn replay_to(
        &mut self,
        generation: u32,
        from_scratch: bool,
    ) -> Result<&SymbolSequence<P>, LSystemError> {
        let mut current_generation = 0;
        let mut resumed = None;
        if !from_scratch {
            for candidate in (1..generation).rev() {
                if let Some(cached) = self.cache.request(self.revision, candidate) {
                    resumed = Some(cached.clone());
                    current_generation = candidate;
                    break;
                }
            }
        }
        let mut current = resumed.unwrap_or_else(|| self.initial.clone());

        while current_generation < generation {
            current_generation += 1;
            apply_generation(
                &mut current,
                &self.rules,
                current_generation,
                None,
                &mut self.rng,
            )?;
            if current_generation < generation {
                self.cache
                    .insert(self.revision, current_generation, current.clone());
            }
        }

        Ok(self.cache.insert(self.revision, generation, current))
    }
}

// Rewrites one sequence level for one generation: branches first, then every
// rule in registration order.
fn apply_generation<P: Clone>(
    sequence: &mut SymbolSequence<P>,
    rules: &[Rule<P>],
    generation: u32,
    parent: Option<&Symbol<P>>,
    rng: &mut GrowthRng,
) -> Result<(), LSystemError> {
    for i in 0..sequence.len() {
        if sequence[i].branch.is_none() {
            continue;
        }
        // The branch's rules see their owner as it stood before this
        // generation touched it.
        let owner = sequence[i].clone();
        if let Some(branch) = sequence[i].branch.as_mut() {
            apply_generation(branch, rules, generation, Some(&owner), rng)?;
        }
    }

    for rule in rules {
        apply_rule(sequence, rule, generation, parent, rng)?;
    }
    Ok(())
}

// One rule's left-to-right pass over one level. Matches are spliced in place
// so the rest of this pass and every later rule see replacements at their
// final positions; the cursor jumps past what was just produced.
fn apply_rule<P: Clone>(
    sequence: &mut SymbolSequence<P>,
    rule: &Rule<P>,
    generation: u32,
    parent: Option<&Symbol<P>>,
    rng: &mut GrowthRng,
) -> Result<(), LSystemError> {
    let mut index = 0;
    while index < sequence.len() {
        let view: &[Symbol<P>] = sequence;
        let symbol = &view[index];

        if symbol.last_touched == Some(generation) && !rule.allow_override {
            index += 1;
            continue;
        }

        let matched = rule.condition.evaluate(&EvalContext {
            symbol,
            index,
            sequence: view,
            generation,
            parent,
        });
        if !matched {
            index += 1;
            continue;
        }

        let replacement = resolve_successor(
            &rule.successor,
            &rule.id,
            &ExpandContext {
                symbol,
                index,
                sequence: view,
                parent,
            },
            generation,
            rng,
        )?;
        let advance = replacement.len();
        sequence.splice(index..=index, replacement);
        index += advance;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::successor::Successor;
    use crate::symbol::{label_sequence, render_labels};

    fn growth(system: &mut LSystem, generation: u32) -> String {
        render_labels(system.output(generation).unwrap())
    }

    fn algae() -> LSystem {
        LSystem::new(label_sequence("A"))
            .with_rules([
                Rule::for_label("A", Successor::Sequence(label_sequence("AB"))),
                Rule::for_label("B", Successor::Single(Symbol::new("A"))),
            ])
            .unwrap()
    }

    #[test]
    fn rewrites_generation_by_generation() {
        let mut system = algae();
        assert_eq!(growth(&mut system, 1), "AB");
        assert_eq!(growth(&mut system, 2), "ABA");
        assert_eq!(growth(&mut system, 3), "ABAAB");
        assert_eq!(growth(&mut system, 5), "ABAABABAABAAB");
    }

    #[test]
    fn generation_zero_is_the_untouched_initial_sequence() {
        let mut system = algae();
        let _ = system.output(4).unwrap();
        assert_eq!(growth(&mut system, 0), "A");
        assert!(system.output(0).unwrap().iter().all(|s| s.last_touched.is_none()));
    }

    #[test]
    fn backward_queries_replay_from_cached_ancestors() {
        let mut system = algae();
        let _ = system.output(5).unwrap();
        assert_eq!(growth(&mut system, 2), "ABA");
        assert_eq!(growth(&mut system, 4), "ABAABABA");
    }

    #[test]
    fn symbols_produced_this_generation_are_protected() {
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([
                Rule::for_label("A", Successor::Single(Symbol::new("B"))),
                Rule::for_label("B", Successor::Single(Symbol::new("C"))),
            ])
            .unwrap();
        // The B produced while computing generation 1 is not rewritten by
        // the later B rule within that same pass.
        assert_eq!(growth(&mut system, 1), "B");
        assert_eq!(growth(&mut system, 2), "C");
    }

    #[test]
    fn allow_override_opts_out_of_protection() {
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([
                Rule::for_label("A", Successor::Single(Symbol::new("B"))),
                Rule::for_label("B", Successor::Single(Symbol::new("C")))
                    .with_allow_override(true),
            ])
            .unwrap();
        assert_eq!(growth(&mut system, 1), "C");
    }

    #[test]
    fn branch_rules_see_the_owning_symbol_as_parent() {
        let initial = vec![
            Symbol::new("A").with_branch(label_sequence("B")),
            Symbol::new("B"),
        ];
        let mut system = LSystem::new(initial)
            .with_rules([Rule::new(
                "inside-a",
                Condition::and([
                    Condition::match_label("B"),
                    Condition::callback(|ctx: &EvalContext<'_, ()>| {
                        ctx.parent.is_some_and(|p| p.label == "A")
                    }),
                ]),
                Successor::Single(Symbol::new("C")),
            )])
            .unwrap();
        // Only the B inside the branch has an A parent.
        assert_eq!(growth(&mut system, 1), "A[C]B");
    }

    #[test]
    fn replacing_a_rule_invalidates_cached_output() {
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([Rule::new(
                "r",
                Condition::match_label("A"),
                Successor::Single(Symbol::new("B")),
            )])
            .unwrap();
        assert_eq!(growth(&mut system, 1), "B");

        system
            .add_rule(Rule::new(
                "r",
                Condition::match_label("A"),
                Successor::Single(Symbol::new("C")),
            ))
            .unwrap();
        // Replaced in place, not appended.
        assert_eq!(system.rules().len(), 1);
        assert!(system.rule("r").is_some());
        assert_eq!(growth(&mut system, 1), "C");
    }

    #[test]
    fn persisted_cache_serves_stale_output_until_cleared() {
        let mut system = LSystem::new(label_sequence("A"))
            .persist_cache_across_rule_changes(true)
            .with_rules([Rule::new(
                "r",
                Condition::match_label("A"),
                Successor::Single(Symbol::new("B")),
            )])
            .unwrap();
        assert_eq!(growth(&mut system, 1), "B");

        system
            .add_rule(Rule::new(
                "r",
                Condition::match_label("A"),
                Successor::Single(Symbol::new("C")),
            ))
            .unwrap();
        // Stale by choice: the cached generation survives the rule change.
        assert_eq!(growth(&mut system, 1), "B");

        system.clean_cache();
        assert_eq!(growth(&mut system, 1), "C");
    }

    #[test]
    fn removing_rules_takes_effect_and_unknown_ids_fail() {
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([Rule::for_label(
                "A",
                Successor::Single(Symbol::new("B")),
            )])
            .unwrap();
        assert_eq!(growth(&mut system, 1), "B");

        system.remove_rule("A").unwrap();
        assert!(system.rule("A").is_none());
        assert_eq!(growth(&mut system, 1), "A");

        let err = system.remove_rule("A").unwrap_err();
        assert!(matches!(err, LSystemError::RuleNotFound { id } if id == "A"));
    }

    #[test]
    fn malformed_rules_never_enter_the_rule_set() {
        let mut system: LSystem = LSystem::new(label_sequence("A"));
        let err = system
            .add_rule(Rule::for_label("A", Successor::Sequence(vec![])))
            .unwrap_err();
        assert!(matches!(err, LSystemError::MalformedRule { .. }));
        assert!(system.rules().is_empty());
    }

    #[test]
    fn seeded_engines_replay_stochastic_output_identically() {
        let stochastic_rule = || {
            Rule::for_label(
                "A",
                Successor::stochastic([
                    (Successor::Sequence(label_sequence("AB")), 0.5),
                    (Successor::Sequence(label_sequence("BA")), 0.5),
                ]),
            )
        };
        let mut one = LSystem::new(label_sequence("AAAA"))
            .with_seed(99)
            .with_rules([stochastic_rule()])
            .unwrap();
        let mut two = LSystem::new(label_sequence("AAAA"))
            .with_seed(99)
            .with_rules([stochastic_rule()])
            .unwrap();

        for generation in 1..=4 {
            assert_eq!(growth(&mut one, generation), growth(&mut two, generation));
        }
    }

    #[test]
    fn function_successors_can_grow_from_context() {
        // Append one tick mark per rewrite: A, A', A'', ...
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([Rule::new(
                "tick",
                Condition::callback(|ctx: &EvalContext<'_, ()>| {
                    ctx.symbol.label.starts_with('A')
                }),
                Successor::function(|ctx: &ExpandContext<'_, ()>| {
                    Symbol::new(format!("{}'", ctx.symbol.label)).into()
                }),
            )])
            .unwrap();
        assert_eq!(growth(&mut system, 3), "A'''");
    }

    #[test]
    fn engines_with_callbacks_move_between_threads() {
        // Callbacks are Send + Sync, so a whole engine, live rules included,
        // can be handed to another thread and grown there.
        let mut system = LSystem::new(label_sequence("A"))
            .with_rules([Rule::new(
                "tick",
                Condition::callback(|ctx: &EvalContext<'_, ()>| ctx.symbol.label == "A"),
                Successor::function(|ctx: &ExpandContext<'_, ()>| {
                    vec![ctx.symbol.clone(), Symbol::new("B")].into()
                }),
            )])
            .unwrap();

        let grown = std::thread::spawn(move || growth(&mut system, 2))
            .join()
            .unwrap();
        assert_eq!(grown, "ABB");
    }
}
