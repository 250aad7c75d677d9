//! Per-key counting: the local aggregator and the global reducer.

use crate::collection::CombineFn;

/// Sum of `u64` counts per key.
///
/// The same fold serves as the per-partition combiner and as the final
/// reducer. Plain addition is associative and commutative, so running the
/// combiner zero, one, or many times over any split of the emissions leaves
/// the final totals unchanged.
///
/// - Accumulator: `u64`
/// - Output: `u64`
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl CombineFn<u64, u64, u64> for Sum {
    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: &mut u64, v: u64) {
        *acc = acc.saturating_add(v);
    }

    fn merge(&self, acc: &mut u64, other: u64) {
        *acc = acc.saturating_add(other);
    }

    fn finish(&self, acc: u64) -> u64 {
        acc
    }

    fn merge_all(&self, accs: Vec<u64>) -> u64 {
        merge_counts(accs)
    }
}

/// Total of every count emitted for one key, in any order or grouping.
///
/// Saturates at `u64::MAX` instead of wrapping.
pub fn merge_counts<I: IntoIterator<Item = u64>>(counts: I) -> u64 {
    counts.into_iter().fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sums_merge_in_any_order() {
        let partials = [3u64, 2, 5];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let mut acc = Sum.create();
            for i in order {
                Sum.merge(&mut acc, partials[i]);
            }
            assert_eq!(Sum.finish(acc), 10);
        }
        assert_eq!(merge_counts([5, 3, 2]), 10);
    }

    #[test]
    fn grouping_does_not_matter() {
        // ((3 + 2) + 5) == (3 + (2 + 5)) == raw emissions summed once
        let left = merge_counts([merge_counts([3, 2]), 5]);
        let right = merge_counts([3, merge_counts([2, 5])]);
        let flat = merge_counts(std::iter::repeat_n(1u64, 10));
        assert_eq!(left, right);
        assert_eq!(left, flat);
        assert_eq!(merge_counts(Vec::new()), 0);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let mut acc = Sum.create();
        Sum.add_input(&mut acc, u64::MAX - 1);
        Sum.add_input(&mut acc, 5);
        assert_eq!(acc, u64::MAX);
        Sum.merge(&mut acc, 1);
        assert_eq!(Sum.finish(acc), u64::MAX);
        assert_eq!(Sum.merge_all(vec![u64::MAX, u64::MAX]), u64::MAX);
    }
}
