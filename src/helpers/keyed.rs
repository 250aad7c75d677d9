use crate::node::{LocalFn, MergeFn, Node};
use crate::runner::CombinePolicy;
use crate::shuffle::{Shuffled, decode, encode};
use crate::type_token::{Partition, take_vec};
use crate::{PCollection, RFBound};
use anyhow::Result;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

impl<T: RFBound> PCollection<T> {
    /// Pair every element with a key computed from it: T -> (K, T)
    pub fn key_by<K, F>(self, key_fn: F) -> PCollection<(K, T)>
    where
        K: RFBound + Eq + Hash,
        F: 'static + Send + Sync + Fn(&T) -> K,
    {
        self.map(move |t| (key_fn(t), t.clone()))
    }
}

impl<K: RFBound + Eq + Hash, V: RFBound> PCollection<(K, V)> {
    /// Transform values, keeping keys: (K, V) -> (K, O)
    pub fn map_values<O, F>(self, f: F) -> PCollection<(K, O)>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&V) -> O,
    {
        self.map(move |(k, v)| (k.clone(), f(v)))
    }

    /// Group values by key: (K, V) -> (K, Vec<V>)
    ///
    /// Every value of a key, from every partition, ends up in the one output
    /// group for that key. Grouping never pre-aggregates, so the combine
    /// policy does not apply here.
    pub fn group_by_key(self) -> PCollection<(K, Vec<V>)> {
        let local: LocalFn = Arc::new(|p: Partition, _: CombinePolicy| -> Result<Vec<Shuffled>> {
            let kv = take_vec::<(K, V)>(p, "group_by_key local")?;
            let mut m: HashMap<K, Vec<V>> = HashMap::new();
            for (k, v) in kv {
                m.entry(k).or_default().push(v);
            }
            let groups: Vec<(K, Vec<V>)> = m.into_iter().collect();
            Ok(vec![encode("group_by_key local", &groups)?])
        });

        let merge: MergeFn = Arc::new(|blobs: Vec<Shuffled>| -> Result<Partition> {
            let mut acc: HashMap<K, Vec<V>> = HashMap::new();
            for blob in &blobs {
                let groups: Vec<(K, Vec<V>)> = decode("group_by_key merge", blob)?;
                for (k, vs) in groups {
                    acc.entry(k).or_default().extend(vs);
                }
            }
            Ok(Box::new(acc.into_iter().collect::<Vec<(K, Vec<V>)>>()) as Partition)
        });

        self.then(Node::GroupByKey { local, merge })
    }
}
