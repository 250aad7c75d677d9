//! Unkeyed combine: folds a whole collection into a single value.
//!
//! Every partition builds its own accumulator(s) on the map side; all of
//! them are routed to one reduce invocation, which merges them and emits
//! exactly one element, even for empty input (`finish(create())`).

use crate::collection::CombineFn;
use crate::node::{LocalFn, MergeFn, Node};
use crate::runner::CombinePolicy;
use crate::shuffle::{Shuffled, combiner_runs, decode, encode};
use crate::type_token::{Partition, take_vec};
use crate::{PCollection, RFBound};
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

impl<T: RFBound> PCollection<T> {
    /// Combine all elements into one output through a [`CombineFn`].
    ///
    /// # Example
    /// ```
    /// use tagtally::*;
    ///
    /// let p = Pipeline::default();
    /// let total = from_vec(&p, vec![3u64, 2, 5])
    ///     .combine_globally(Sum)
    ///     .collect_par(None, Some(3))?;
    /// assert_eq!(total, vec![10]);
    /// # Ok::<_, anyhow::Error>(())
    /// ```
    pub fn combine_globally<C, A, O>(self, comb: C) -> PCollection<O>
    where
        C: CombineFn<T, A, O> + 'static,
        A: Send + Sync + Serialize + DeserializeOwned + 'static,
        O: RFBound,
    {
        let comb = Arc::new(comb);

        let local: LocalFn = {
            let comb = Arc::clone(&comb);
            Arc::new(move |p: Partition, policy: CombinePolicy| -> Result<Vec<Shuffled>> {
                let rows = take_vec::<T>(p, "combine_globally local")?;
                let mut out = Vec::new();
                for run in combiner_runs(rows, policy) {
                    let mut acc = comb.create();
                    for v in run {
                        comb.add_input(&mut acc, v);
                    }
                    out.push(encode("combine_globally local", &acc)?);
                }
                Ok(out)
            })
        };

        let merge: MergeFn = {
            let comb = Arc::clone(&comb);
            Arc::new(move |blobs: Vec<Shuffled>| -> Result<Partition> {
                let accs = blobs
                    .iter()
                    .map(|b| decode::<A>("combine_globally merge", b))
                    .collect::<Result<Vec<A>, _>>()?;
                let out: Vec<O> = vec![comb.finish(comb.merge_all(accs))];
                Ok(Box::new(out) as Partition)
            })
        };

        self.then(Node::CombineGlobal { local, merge })
    }
}
