//! Per-rule memoization cache.
//!
//! Maps `(token position, rule id)` to the rule's outcome and the cursor
//! position after it ran, making repeated rule invocation at the same
//! position O(1) under backtracking. Failures are cached too (`None`
//! results); an entry, once written, is only ever re-derivable to the same
//! value, so replay is pure. The whole cache is dropped once, when the
//! driver enters the diagnostic re-parse.

use rustc_hash::FxHashMap;

/// Identifier of a grammar production; unique per production and stable
/// across both driver passes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RuleId(pub u16);

#[derive(Clone, Debug)]
struct MemoEntry<T> {
    result: Option<T>,
    end: usize,
}

/// Result cache for memoized rules.
pub struct RuleCache<T> {
    entries: FxHashMap<(usize, RuleId), MemoEntry<T>>,
    hits: u64,
    misses: u64,
}

impl<T: Clone> RuleCache<T> {
    pub fn new() -> Self {
        RuleCache {
            entries: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn has(&self, pos: usize, rule: RuleId) -> bool {
        self.entries.contains_key(&(pos, rule))
    }

    /// Cached outcome and end position. The caller must move the cursor to
    /// the returned end position: a cache hit reproduces exactly the
    /// cursor advancement a fresh invocation would have caused.
    pub fn get(&mut self, pos: usize, rule: RuleId) -> Option<(Option<T>, usize)> {
        match self.entries.get(&(pos, rule)) {
            Some(entry) => {
                self.hits += 1;
                Some((entry.result.clone(), entry.end))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Record a rule outcome together with the cursor position at time of
    /// insertion, returning the result unchanged so call sites can memoize
    /// and return in one expression.
    pub fn put(&mut self, pos: usize, rule: RuleId, result: Option<T>, end: usize) -> Option<T> {
        self.entries
            .insert((pos, rule), MemoEntry { result: result.clone(), end });
        result
    }

    /// Wipe all entries; called exactly once, when a failed first-pass
    /// parse triggers the recovery re-parse.
    pub fn clear(&mut self) {
        tracing::debug!(
            entries = self.entries.len(),
            hits = self.hits,
            misses = self.misses,
            "clearing rule cache"
        );
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for RuleCache<T> {
    fn default() -> Self {
        RuleCache::new()
    }
}
