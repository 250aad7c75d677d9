//! Collectors that sort their output.
//!
//! Barriers emit keys in hash-map order, so anything compared or written out
//! should go through one of these.

use crate::runner::Runner;
use crate::{PCollection, RFBound};
use anyhow::Result;

impl<T: RFBound + Ord> PCollection<T> {
    /// Collect sequentially and sort.
    pub fn collect_seq_sorted(self) -> Result<Vec<T>> {
        let mut v = self.collect_seq()?;
        v.sort();
        Ok(v)
    }

    /// Collect in parallel and sort.
    pub fn collect_par_sorted(
        self,
        threads: Option<usize>,
        partitions: Option<usize>,
    ) -> Result<Vec<T>> {
        let mut v = self.collect_par(threads, partitions)?;
        v.sort();
        Ok(v)
    }
}

impl<K: RFBound + Ord, V: RFBound> PCollection<(K, V)> {
    /// Collect `(K, V)` pairs with `runner` and sort by key only.
    pub fn collect_sorted_by_key_with(self, runner: &Runner) -> Result<Vec<(K, V)>> {
        let mut v = self.collect_with(runner)?;
        v.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(v)
    }

    /// Collect `(K, V)` pairs in parallel and sort by key only.
    pub fn collect_par_sorted_by_key(
        self,
        threads: Option<usize>,
        partitions: Option<usize>,
    ) -> Result<Vec<(K, V)>> {
        let mut v = self.collect_par(threads, partitions)?;
        v.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(v)
    }
}
