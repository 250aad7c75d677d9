//! Bounded top-K selection and the reducer that merges partial selections.
//!
//! One structure, [`BoundedTopK`], is used at both levels: each partition
//! builds one over its own entries, and [`TopKMergeReducer`] builds a fresh
//! one over the union of every partition's survivors. Any entry of the true
//! global top-K is also in the top-K of the partition that produced it, so
//! the union of the partials always contains the answer and re-selecting
//! over it yields the answer exactly.

use crate::collection::CombineFn;
use crate::error::{TallyError, TallyResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A scored key.
///
/// Ordered by rank: a *greater* entry ranks higher. Higher scores rank first;
/// equal scores rank by key ascending, so `("A", 10)` outranks `("B", 10)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopKEntry {
    pub score: u64,
    pub key: String,
}

impl TopKEntry {
    pub fn new(key: impl Into<String>, score: u64) -> Self {
        Self {
            score,
            key: key.into(),
        }
    }

    /// `(key, count)` as written to job output.
    #[must_use]
    pub fn into_pair(self) -> (String, u64) {
        (self.key, self.score)
    }
}

impl Ord for TopKEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for TopKEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed-capacity set holding the `capacity` highest-ranked entries seen.
///
/// Inserting past capacity evicts the lowest-ranked entry, so everything
/// retained ranks at least as high as anything ever evicted. Inserting an
/// entry that is already present is a no-op, which keeps replayed partials
/// from taking two slots.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TopKParts", into = "TopKParts")]
pub struct BoundedTopK {
    capacity: usize,
    entries: BTreeSet<TopKEntry>,
}

impl BoundedTopK {
    /// An empty selector; a capacity of zero is rejected.
    pub fn new(capacity: usize) -> TallyResult<Self> {
        if capacity == 0 {
            return Err(TallyError::CapacityViolation { k: capacity });
        }
        Ok(Self::empty(capacity))
    }

    // Callers have already validated `capacity`.
    fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `entry`, returning whichever entry had to be evicted.
    ///
    /// `O(log K)`. The evicted entry may be `entry` itself when it ranks below
    /// everything already held.
    pub fn insert(&mut self, entry: TopKEntry) -> Option<TopKEntry> {
        self.entries.insert(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_first()
        } else {
            None
        }
    }

    /// Fold every entry of `other` into `self`, keeping `self`'s capacity.
    pub fn absorb(&mut self, other: Self) {
        for e in other.entries {
            self.insert(e);
        }
    }

    /// Union of `a` and `b`, cut back to `k` entries.
    ///
    /// Associative and commutative: any merge tree over the same partials
    /// yields the same set.
    pub fn merge(a: Self, b: Self, k: usize) -> TallyResult<Self> {
        let mut out = Self::new(k)?;
        out.absorb(a);
        out.absorb(b);
        Ok(out)
    }

    /// Entries from highest to lowest rank, without consuming the set.
    pub fn iter(&self) -> impl Iterator<Item = &TopKEntry> {
        self.entries.iter().rev()
    }

    /// Consume the set, highest rank first: score descending, key ascending.
    #[must_use]
    pub fn drain(self) -> Vec<TopKEntry> {
        self.entries.into_iter().rev().collect()
    }
}

/// Wire shape of a [`BoundedTopK`]; decoding re-checks the bound.
#[derive(Serialize, Deserialize)]
struct TopKParts {
    capacity: usize,
    entries: Vec<TopKEntry>,
}

impl From<BoundedTopK> for TopKParts {
    fn from(set: BoundedTopK) -> Self {
        Self {
            capacity: set.capacity,
            entries: set.entries.into_iter().collect(),
        }
    }
}

impl TryFrom<TopKParts> for BoundedTopK {
    type Error = TallyError;

    fn try_from(parts: TopKParts) -> TallyResult<Self> {
        let mut set = Self::new(parts.capacity)?;
        if parts.entries.len() > parts.capacity {
            return Err(TallyError::partial(
                "top-k partial",
                format!(
                    "{} entries exceed capacity {}",
                    parts.entries.len(),
                    parts.capacity
                ),
            ));
        }
        for e in parts.entries {
            set.insert(e);
        }
        Ok(set)
    }
}

/// Merges the partial top-K sets of every partition into the global top-K.
///
/// All partials are routed to a single reducer, which inserts every incoming
/// entry into a fresh selector of the same capacity.
#[derive(Clone, Copy, Debug)]
pub struct TopKMergeReducer {
    k: usize,
}

impl TopKMergeReducer {
    pub fn new(k: usize) -> TallyResult<Self> {
        if k == 0 {
            return Err(TallyError::CapacityViolation { k });
        }
        Ok(Self { k })
    }

    /// Union of `partials`, re-selected down to `k`.
    pub fn merge<I: IntoIterator<Item = BoundedTopK>>(&self, partials: I) -> BoundedTopK {
        let mut out = BoundedTopK::empty(self.k);
        for p in partials {
            out.absorb(p);
        }
        out
    }

    /// Merge already-drained partial lists and emit the final ranking.
    pub fn reduce<I>(&self, partials: I) -> Vec<TopKEntry>
    where
        I: IntoIterator<Item = Vec<TopKEntry>>,
    {
        let mut out = BoundedTopK::empty(self.k);
        for e in partials.into_iter().flatten() {
            out.insert(e);
        }
        out.drain()
    }
}

/// Global top-K as a [`CombineFn`].
///
/// - Accumulator: [`BoundedTopK`] (one per combiner run)
/// - Output: `Vec<TopKEntry>`, highest rank first
#[derive(Clone, Copy, Debug)]
pub struct TopK {
    reducer: TopKMergeReducer,
}

impl TopK {
    /// Validates `k` before any record is processed.
    pub fn new(k: usize) -> TallyResult<Self> {
        Ok(Self {
            reducer: TopKMergeReducer::new(k)?,
        })
    }

    #[must_use]
    pub const fn k(&self) -> usize {
        self.reducer.k
    }
}

impl CombineFn<TopKEntry, BoundedTopK, Vec<TopKEntry>> for TopK {
    fn create(&self) -> BoundedTopK {
        BoundedTopK::empty(self.reducer.k)
    }

    fn add_input(&self, acc: &mut BoundedTopK, v: TopKEntry) {
        acc.insert(v);
    }

    fn merge(&self, acc: &mut BoundedTopK, other: BoundedTopK) {
        acc.absorb(other);
    }

    fn finish(&self, acc: BoundedTopK) -> Vec<TopKEntry> {
        acc.drain()
    }

    fn merge_all(&self, accs: Vec<BoundedTopK>) -> BoundedTopK {
        self.reducer.merge(accs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(key: &str, score: u64) -> TopKEntry {
        TopKEntry::new(key, score)
    }

    fn permutations(items: &[TopKEntry]) -> Vec<Vec<TopKEntry>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn keeps_the_two_best_in_any_insertion_order() {
        let input = [e("A", 10), e("B", 7), e("C", 9), e("D", 1)];
        for order in permutations(&input) {
            let mut set = BoundedTopK::new(2).unwrap();
            for entry in order {
                set.insert(entry);
            }
            assert_eq!(set.drain(), vec![e("A", 10), e("C", 9)]);
        }
    }

    #[test]
    fn ties_resolve_to_the_smaller_key() {
        for order in [[e("A", 10), e("B", 10)], [e("B", 10), e("A", 10)]] {
            let mut set = BoundedTopK::new(1).unwrap();
            for entry in order {
                set.insert(entry);
            }
            assert_eq!(set.drain(), vec![e("A", 10)]);
        }
    }

    #[test]
    fn insert_reports_the_evicted_entry() {
        let mut set = BoundedTopK::new(1).unwrap();
        assert_eq!(set.insert(e("A", 5)), None);
        assert_eq!(set.insert(e("B", 3)), Some(e("B", 3)));
        assert_eq!(set.insert(e("C", 8)), Some(e("A", 5)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            BoundedTopK::new(0),
            Err(TallyError::CapacityViolation { k: 0 })
        ));
        assert!(TopK::new(0).is_err());
        assert!(TopKMergeReducer::new(0).is_err());
    }

    #[test]
    fn merged_partials_equal_the_global_top_k() {
        let mut p1 = BoundedTopK::new(2).unwrap();
        for x in [e("A", 10), e("B", 7), e("C", 9)] {
            p1.insert(x);
        }
        let mut p2 = BoundedTopK::new(2).unwrap();
        for x in [e("D", 1), e("E", 20)] {
            p2.insert(x);
        }
        assert_eq!(p1.iter().cloned().collect::<Vec<_>>(), vec![e("A", 10), e("C", 9)]);
        assert_eq!(p2.iter().cloned().collect::<Vec<_>>(), vec![e("E", 20), e("D", 1)]);

        let ab = BoundedTopK::merge(p1.clone(), p2.clone(), 2).unwrap();
        let ba = BoundedTopK::merge(p2, p1, 2).unwrap();
        assert_eq!(ab.drain(), vec![e("E", 20), e("A", 10)]);
        assert_eq!(ba.drain(), vec![e("E", 20), e("A", 10)]);
    }

    #[test]
    fn reducer_is_order_independent_and_replay_safe() {
        let reducer = TopKMergeReducer::new(3).unwrap();
        let parts = vec![
            vec![e("x", 4), e("y", 4)],
            vec![e("z", 9), e("a", 1)],
            vec![e("b", 4)],
        ];
        let forward = reducer.reduce(parts.clone());
        let backward = reducer.reduce(parts.iter().rev().cloned());
        let replayed = reducer.reduce(parts.iter().chain(parts.iter()).cloned());
        let expected = vec![e("z", 9), e("b", 4), e("x", 4)];
        assert_eq!(forward, expected);
        assert_eq!(backward, expected);
        assert_eq!(replayed, expected);
    }

    #[test]
    fn oversized_partial_does_not_decode() {
        let blob = br#"{"capacity":1,"entries":[{"score":1,"key":"a"},{"score":2,"key":"b"}]}"#;
        assert!(serde_json::from_slice::<BoundedTopK>(blob).is_err());
        let blob = br#"{"capacity":0,"entries":[]}"#;
        assert!(serde_json::from_slice::<BoundedTopK>(blob).is_err());
    }

    #[test]
    fn partial_round_trips_through_the_wire_shape() {
        let mut set = BoundedTopK::new(3).unwrap();
        set.insert(e("b", 2));
        set.insert(e("a", 2));
        let blob = serde_json::to_vec(&set).unwrap();
        let back: BoundedTopK = serde_json::from_slice(&blob).unwrap();
        assert_eq!(back.capacity(), 3);
        assert_eq!(back.drain(), vec![e("a", 2), e("b", 2)]);
    }
}
