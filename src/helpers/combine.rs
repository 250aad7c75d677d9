use crate::collection::CombineFn;
use crate::node::{LocalFn, MergeFn, Node};
use crate::runner::CombinePolicy;
use crate::shuffle::{Shuffled, combiner_runs, decode, encode};
use crate::type_token::{Partition, take_vec};
use crate::{PCollection, RFBound};
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

impl<K: RFBound + Eq + Hash, V: RFBound> PCollection<(K, V)> {
    /// Combine-by-key through a user-supplied [`CombineFn`].
    ///
    /// Map side: each combiner run of a partition folds its pairs into one
    /// accumulator per key and ships `Vec<(K, A)>`. Reduce side: every
    /// accumulator for a key, from every partition, goes through one
    /// `merge_all` + `finish`.
    pub fn combine_values<C, A, O>(self, comb: C) -> PCollection<(K, O)>
    where
        C: CombineFn<V, A, O> + 'static,
        A: Send + Sync + Serialize + DeserializeOwned + 'static,
        O: RFBound,
    {
        let comb = Arc::new(comb);

        let local: LocalFn = {
            let comb = Arc::clone(&comb);
            Arc::new(move |p: Partition, policy: CombinePolicy| -> Result<Vec<Shuffled>> {
                let kv = take_vec::<(K, V)>(p, "combine local")?;
                let mut out = Vec::new();
                for run in combiner_runs(kv, policy) {
                    let mut accs: HashMap<K, A> = HashMap::new();
                    for (k, v) in run {
                        comb.add_input(accs.entry(k).or_insert_with(|| comb.create()), v);
                    }
                    let partial: Vec<(K, A)> = accs.into_iter().collect();
                    out.push(encode("combine local", &partial)?);
                }
                Ok(out)
            })
        };

        let merge: MergeFn = {
            let comb = Arc::clone(&comb);
            Arc::new(move |blobs: Vec<Shuffled>| -> Result<Partition> {
                let mut grouped: HashMap<K, Vec<A>> = HashMap::new();
                for blob in &blobs {
                    let partial: Vec<(K, A)> = decode("combine merge", blob)?;
                    for (k, a) in partial {
                        grouped.entry(k).or_default().push(a);
                    }
                }
                let out: Vec<(K, O)> = grouped
                    .into_iter()
                    .map(|(k, accs)| (k, comb.finish(comb.merge_all(accs))))
                    .collect();
                Ok(Box::new(out) as Partition)
            })
        };

        self.then(Node::CombineValues { local, merge })
    }
}
