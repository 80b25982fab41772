//! Co-occurrence lookup: the provider seam, a table implementation, and the
//! explicit memo cache owned by the corpus builder.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Symmetric (entity_a, entity_b) → segment count
pub trait CooccurrenceProvider {
    fn count(&self, entity_a: &str, entity_b: &str) -> u64;
}

impl<F> CooccurrenceProvider for F
where
    F: Fn(&str, &str) -> u64,
{
    fn count(&self, entity_a: &str, entity_b: &str) -> u64 {
        self(entity_a, entity_b)
    }
}

/// Order-independent key for an unordered entity pair
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// One row of a co-occurrence export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceEntry {
    pub entity_a: String,
    pub entity_b: String,
    pub count: u64,
}

/// In-memory symmetric co-occurrence table
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceTable {
    counts: HashMap<(String, String), u64>,
}

impl CooccurrenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries; duplicate pairs (in either order) are summed
    pub fn from_entries(entries: &[CooccurrenceEntry]) -> Self {
        let mut table = Self::new();
        for e in entries {
            table.add(&e.entity_a, &e.entity_b, e.count);
        }
        table
    }

    /// Build from text segments, each a list of entities appearing in it
    pub fn from_segments(segments: &[Vec<String>]) -> Self {
        let mut table = Self::new();
        for segment in segments {
            let mut members: Vec<&String> = segment.iter().collect();
            members.sort();
            members.dedup();
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    table.add(members[i], members[j], 1);
                }
            }
        }
        table
    }

    pub fn add(&mut self, a: &str, b: &str, count: u64) {
        if a == b {
            return;
        }
        let slot = self.counts.entry(pair_key(a, b)).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Sum another table's counts into this one, saturating at `u64::MAX`
    pub fn merge(&mut self, other: &CooccurrenceTable) {
        for (key, count) in &other.counts {
            let slot = self.counts.entry(key.clone()).or_insert(0);
            *slot = slot.saturating_add(*count);
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl CooccurrenceProvider for CooccurrenceTable {
    fn count(&self, entity_a: &str, entity_b: &str) -> u64 {
        self.counts
            .get(&pair_key(entity_a, entity_b))
            .copied()
            .unwrap_or(0)
    }
}

/// Memo of provider lookups, keyed by unordered pair.
///
/// Owned by a [`super::corpus::CorpusBuilder`]; call [`invalidate`] when the
/// underlying data source changes.
///
/// [`invalidate`]: CooccurrenceCache::invalidate
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceCache {
    memo: HashMap<(String, String), u64>,
    hits: u64,
    misses: u64,
}

impl CooccurrenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached lookup; consults `provider` only on a miss
    pub fn lookup<P: CooccurrenceProvider + ?Sized>(
        &mut self,
        provider: &P,
        a: &str,
        b: &str,
    ) -> u64 {
        let key = pair_key(a, b);
        if let Some(&count) = self.memo.get(&key) {
            self.hits += 1;
            return count;
        }
        self.misses += 1;
        let count = provider.count(&key.0, &key.1);
        self.memo.insert(key, count);
        count
    }

    /// Drop all memoized counts
    pub fn invalidate(&mut self) {
        self.memo.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_table_is_symmetric() {
        let mut table = CooccurrenceTable::new();
        table.add("zeus", "hera", 5);
        table.add("hera", "zeus", 2);
        assert_eq!(table.count("zeus", "hera"), 7);
        assert_eq!(table.count("hera", "zeus"), 7);
        assert_eq!(table.count("zeus", "odin"), 0);
        table.add("zeus", "zeus", 3);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_counts_saturate_instead_of_overflowing() {
        let mut table = CooccurrenceTable::new();
        table.add("zeus", "hera", u64::MAX - 1);
        table.add("hera", "zeus", 5);
        assert_eq!(table.count("zeus", "hera"), u64::MAX);

        let mut other = CooccurrenceTable::new();
        other.add("zeus", "hera", 10);
        other.add("odin", "thor", 3);
        table.merge(&other);
        assert_eq!(table.count("zeus", "hera"), u64::MAX);
        assert_eq!(table.count("thor", "odin"), 3);
    }

    #[test]
    fn test_from_segments() {
        let segments = vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
        ];
        let table = CooccurrenceTable::from_segments(&segments);
        assert_eq!(table.count("a", "b"), 2);
        assert_eq!(table.count("c", "a"), 1);
        assert_eq!(table.count("b", "c"), 1);
    }

    #[test]
    fn test_cache_hits_and_invalidation() {
        let calls = Cell::new(0u64);
        let provider = |_: &str, _: &str| {
            calls.set(calls.get() + 1);
            4u64
        };

        let mut cache = CooccurrenceCache::new();
        assert_eq!(cache.lookup(&provider, "x", "y"), 4);
        assert_eq!(cache.lookup(&provider, "y", "x"), 4);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.hits(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
        cache.lookup(&provider, "x", "y");
        assert_eq!(calls.get(), 2);
    }
}
