// Per-generation memoization for the iteration engine.
//
// The cache maps generation numbers to fully rewritten sequences, scoped to
// one rule-set identity: a bare token the engine advances whenever its rule
// set changes. Entries recorded under one identity are invisible under any
// other, and the first insert under a fresh identity drops everything older,
// so a stale sequence computed against a superseded rule set can never be
// served by accident. The engine keeps the identity fixed across rule
// mutation only when a caller opts into stale reads (see `lsystem.rs`).
//
// Whole generations are the memoization unit. That keeps invalidation
// trivial and the rewrite step a pure function of sequence and generation
// number, at the cost of recomputing a full generation when its direct
// ancestor is missing.

use crate::symbol::SymbolSequence;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Identity token for one rule-set revision.
pub type RuleSetIdentity = u64;

#[derive(Debug, Clone, Default)]
pub struct IterationCache<P = ()> {
    identity: Option<RuleSetIdentity>,
    entries: FxHashMap<u32, SymbolSequence<P>>,
}

impl<P> IterationCache<P> {
    pub fn new() -> Self {
        Self {
            identity: None,
            entries: FxHashMap::default(),
        }
    }

    /// Look up the sequence cached for `generation`, provided the cache
    /// currently belongs to `identity`.
    pub fn request(
        &self,
        identity: RuleSetIdentity,
        generation: u32,
    ) -> Option<&SymbolSequence<P>> {
        if self.identity != Some(identity) {
            return None;
        }
        self.entries.get(&generation)
    }

    /// Remove and return the entry for `generation` under `identity`. Lets a
    /// caller borrow a hit without cloning by reinserting what it took.
    pub fn take(
        &mut self,
        identity: RuleSetIdentity,
        generation: u32,
    ) -> Option<SymbolSequence<P>> {
        if self.identity != Some(identity) {
            return None;
        }
        self.entries.remove(&generation)
    }

    /// Record the sequence for `generation` under `identity`, dropping every
    /// entry of any prior identity first. Returns a reference to the stored
    /// entry.
    pub fn insert(
        &mut self,
        identity: RuleSetIdentity,
        generation: u32,
        sequence: SymbolSequence<P>,
    ) -> &SymbolSequence<P> {
        if self.identity != Some(identity) {
            self.entries.clear();
            self.identity = Some(identity);
        }
        match self.entries.entry(generation) {
            Entry::Occupied(mut slot) => {
                slot.insert(sequence);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(sequence),
        }
    }

    /// Drop every entry. The identity is untouched; the next insert under
    /// the same identity starts refilling an empty table.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::label_sequence;

    #[test]
    fn entries_overwrite_and_read_back() {
        let mut cache: IterationCache = IterationCache::new();
        let first = label_sequence("AB");
        let second = label_sequence("ABA");

        cache.insert(1, 1, first.clone());
        cache.insert(1, 2, second.clone());
        cache.insert(1, 1, second.clone());
        let stored = cache.insert(1, 1, first.clone());
        assert_eq!(stored, &first);

        assert_eq!(cache.request(1, 1), Some(&first));
        assert_eq!(cache.request(1, 2), Some(&second));
        assert_eq!(cache.request(1, 3), None);
    }

    #[test]
    fn taking_removes_the_entry() {
        let mut cache: IterationCache = IterationCache::new();
        cache.insert(1, 1, label_sequence("AB"));

        assert_eq!(cache.take(2, 1), None);
        assert_eq!(cache.take(1, 1), Some(label_sequence("AB")));
        assert_eq!(cache.request(1, 1), None);
    }

    #[test]
    fn clearing_empties_the_table() {
        let mut cache: IterationCache = IterationCache::new();
        cache.insert(1, 1, label_sequence("AB"));
        cache.clear();
        assert_eq!(cache.request(1, 1), None);
    }

    #[test]
    fn requests_under_a_foreign_identity_miss() {
        let mut cache: IterationCache = IterationCache::new();
        cache.insert(7, 1, label_sequence("AB"));
        assert!(cache.request(7, 1).is_some());
        assert_eq!(cache.request(8, 1), None);
    }

    #[test]
    fn inserting_under_a_new_identity_drops_prior_entries() {
        let mut cache: IterationCache = IterationCache::new();
        cache.insert(1, 1, label_sequence("AB"));
        cache.insert(1, 2, label_sequence("ABA"));

        cache.insert(2, 5, label_sequence("X"));

        assert_eq!(cache.request(1, 1), None);
        assert_eq!(cache.request(1, 2), None);
        assert_eq!(cache.request(2, 5), Some(&label_sequence("X")));
        assert_eq!(cache.request(2, 1), None);
    }
}
