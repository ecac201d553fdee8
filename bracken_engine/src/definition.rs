// Plain-data snapshots of a system: the initial sequence plus the rule set,
// expressed entirely in serde-friendly types so a caller can persist them in
// any standard interchange format and hand them back later.
//
// The snapshot types mirror only the declarative subset of the engine's rule
// language. Callback conditions and function successors are live code, not
// data; exporting a rule that carries one fails with `UnexportableRule`
// naming the rule, rather than quietly dropping the functional part and
// shipping a rule that behaves differently on re-import.
//
// Import is all-or-nothing: `into_parts` checks the whole definition
// (duplicate ids, structurally invalid successors) before any rule is
// constructed for the engine, so a bad snapshot never half-replaces an
// engine's state (see `LSystem::import_definition`).

use crate::condition::Condition;
use crate::error::{invalid, LSystemError};
use crate::rule::Rule;
use crate::successor::{StochasticEntry, Successor};
use crate::symbol::{Symbol, SymbolSequence};
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Serializable mirror of the declarative [`Condition`] variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSpec {
    MatchLabel(Vec<String>),
    Not(Box<ConditionSpec>),
    And(Vec<ConditionSpec>),
    Or(Vec<ConditionSpec>),
    Before(Box<ConditionSpec>),
    BeforeAll(Box<ConditionSpec>),
    After(Box<ConditionSpec>),
    AfterAll(Box<ConditionSpec>),
    RelativeTo {
        offset: isize,
        condition: Box<ConditionSpec>,
    },
}

/// Serializable mirror of the declarative [`Successor`] variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessorSpec<P = ()> {
    Single(Symbol<P>),
    Sequence(SymbolSequence<P>),
    Stochastic(Vec<StochasticEntrySpec<P>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticEntrySpec<P = ()> {
    pub successor: SuccessorSpec<P>,
    pub probability: f64,
}

/// One rule as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec<P = ()> {
    pub id: String,
    pub condition: ConditionSpec,
    pub successor: SuccessorSpec<P>,
    #[serde(default)]
    pub allow_override: bool,
}

/// A complete system snapshot: what [`LSystem::export_definition`] produces
/// and [`LSystem::import_definition`] consumes.
///
/// [`LSystem::export_definition`]: crate::lsystem::LSystem::export_definition
/// [`LSystem::import_definition`]: crate::lsystem::LSystem::import_definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDefinition<P = ()> {
    pub initial: SymbolSequence<P>,
    pub rules: Vec<RuleSpec<P>>,
}

impl<P: Clone> SystemDefinition<P> {
    /// Snapshot an engine's parts. Fails with `UnexportableRule` on the
    /// first rule carrying a callback condition or function successor.
    pub(crate) fn from_parts(
        initial: &SymbolSequence<P>,
        rules: &[Rule<P>],
    ) -> Result<Self, LSystemError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(RuleSpec {
                    id: rule.id.clone(),
                    condition: condition_to_spec(&rule.condition, &rule.id)?,
                    successor: successor_to_spec(&rule.successor, &rule.id)?,
                    allow_override: rule.allow_override,
                })
            })
            .collect::<Result<Vec<_>, LSystemError>>()?;
        Ok(Self {
            initial: initial.clone(),
            rules,
        })
    }

    /// Check the whole definition and rebuild engine parts from it. Nothing
    /// is returned unless every rule is well-formed and ids are unique.
    pub(crate) fn into_parts(self) -> Result<(SymbolSequence<P>, Vec<Rule<P>>), LSystemError> {
        let mut seen = FxHashSet::default();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(invalid(format!("duplicate rule id `{}`", rule.id)));
            }
        }

        let rules = self
            .rules
            .into_iter()
            .map(|spec| {
                let rule = Rule {
                    id: spec.id,
                    condition: condition_from_spec(spec.condition),
                    successor: successor_from_spec(spec.successor),
                    allow_override: spec.allow_override,
                };
                rule.validate().map_err(|e| invalid(e.to_string()))?;
                Ok(rule)
            })
            .collect::<Result<Vec<_>, LSystemError>>()?;
        Ok((self.initial, rules))
    }
}

impl<P: Serialize> SystemDefinition<P> {
    /// Serialize the definition to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<P: DeserializeOwned> SystemDefinition<P> {
    /// Parse a definition from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn condition_to_spec<P>(
    condition: &Condition<P>,
    rule_id: &str,
) -> Result<ConditionSpec, LSystemError> {
    let spec = match condition {
        Condition::MatchLabel(labels) => ConditionSpec::MatchLabel(labels.clone()),
        Condition::MatchCallback(_) => {
            return Err(LSystemError::UnexportableRule {
                id: rule_id.to_string(),
            });
        }
        Condition::Not(c) => ConditionSpec::Not(Box::new(condition_to_spec(c, rule_id)?)),
        Condition::And(cs) => ConditionSpec::And(conditions_to_specs(cs, rule_id)?),
        Condition::Or(cs) => ConditionSpec::Or(conditions_to_specs(cs, rule_id)?),
        Condition::Before(c) => ConditionSpec::Before(Box::new(condition_to_spec(c, rule_id)?)),
        Condition::BeforeAll(c) => {
            ConditionSpec::BeforeAll(Box::new(condition_to_spec(c, rule_id)?))
        }
        Condition::After(c) => ConditionSpec::After(Box::new(condition_to_spec(c, rule_id)?)),
        Condition::AfterAll(c) => {
            ConditionSpec::AfterAll(Box::new(condition_to_spec(c, rule_id)?))
        }
        Condition::RelativeTo { offset, condition } => ConditionSpec::RelativeTo {
            offset: *offset,
            condition: Box::new(condition_to_spec(condition, rule_id)?),
        },
    };
    Ok(spec)
}

fn conditions_to_specs<P>(
    conditions: &[Condition<P>],
    rule_id: &str,
) -> Result<Vec<ConditionSpec>, LSystemError> {
    conditions
        .iter()
        .map(|c| condition_to_spec(c, rule_id))
        .collect()
}

fn condition_from_spec<P>(spec: ConditionSpec) -> Condition<P> {
    match spec {
        ConditionSpec::MatchLabel(labels) => Condition::MatchLabel(labels),
        ConditionSpec::Not(c) => Condition::Not(Box::new(condition_from_spec(*c))),
        ConditionSpec::And(cs) => {
            Condition::And(cs.into_iter().map(condition_from_spec).collect())
        }
        ConditionSpec::Or(cs) => Condition::Or(cs.into_iter().map(condition_from_spec).collect()),
        ConditionSpec::Before(c) => Condition::Before(Box::new(condition_from_spec(*c))),
        ConditionSpec::BeforeAll(c) => Condition::BeforeAll(Box::new(condition_from_spec(*c))),
        ConditionSpec::After(c) => Condition::After(Box::new(condition_from_spec(*c))),
        ConditionSpec::AfterAll(c) => Condition::AfterAll(Box::new(condition_from_spec(*c))),
        ConditionSpec::RelativeTo { offset, condition } => Condition::RelativeTo {
            offset,
            condition: Box::new(condition_from_spec(*condition)),
        },
    }
}

fn successor_to_spec<P: Clone>(
    successor: &Successor<P>,
    rule_id: &str,
) -> Result<SuccessorSpec<P>, LSystemError> {
    let spec = match successor {
        Successor::Single(symbol) => SuccessorSpec::Single(symbol.clone()),
        Successor::Sequence(symbols) => SuccessorSpec::Sequence(symbols.clone()),
        Successor::Function(_) => {
            return Err(LSystemError::UnexportableRule {
                id: rule_id.to_string(),
            });
        }
        Successor::Stochastic(entries) => SuccessorSpec::Stochastic(
            entries
                .iter()
                .map(|entry| {
                    Ok(StochasticEntrySpec {
                        successor: successor_to_spec(&entry.successor, rule_id)?,
                        probability: entry.probability,
                    })
                })
                .collect::<Result<Vec<_>, LSystemError>>()?,
        ),
    };
    Ok(spec)
}

fn successor_from_spec<P>(spec: SuccessorSpec<P>) -> Successor<P> {
    match spec {
        SuccessorSpec::Single(symbol) => Successor::Single(symbol),
        SuccessorSpec::Sequence(symbols) => Successor::Sequence(symbols),
        SuccessorSpec::Stochastic(entries) => Successor::Stochastic(
            entries
                .into_iter()
                .map(|entry| StochasticEntry {
                    successor: successor_from_spec(entry.successor),
                    probability: entry.probability,
                })
                .collect(),
        ),
    }
}
