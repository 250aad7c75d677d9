//! Typed collection handles and the element-wise transforms on them.

use crate::error::TallyError;
use crate::node::{DynOp, Node};
use crate::node_id::NodeId;
use crate::pipeline::Pipeline;
use crate::runner::{ExecMode, Runner};
use crate::type_token::{Partition, TypeTag, take_vec, vec_ops_for};
use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;

/// Bound for anything that flows through a pipeline.
///
/// Elements may be moved across threads and serialized at barriers.
pub trait RFBound: 'static + Send + Sync + Clone + Serialize + DeserializeOwned {}
impl<T> RFBound for T where T: 'static + Send + Sync + Clone + Serialize + DeserializeOwned {}

/// A lazily evaluated collection of `T` inside a [`Pipeline`].
#[derive(Clone)]
pub struct PCollection<T> {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
    pub(crate) _t: PhantomData<T>,
}

impl<T> PCollection<T> {
    /// Append `node` after this collection and return a handle to its output.
    pub(crate) fn then<O>(self, node: Node) -> PCollection<O> {
        let id = self.pipeline.insert_node(node);
        self.pipeline.connect(self.id, id);
        PCollection {
            pipeline: self.pipeline,
            id,
            _t: PhantomData,
        }
    }
}

/// Aggregation contract shared by the combine-by-key and global combine steps.
///
/// `create`/`add_input` run on the map side, once per spill of a partition
/// (possibly never), `merge`/`finish` on the reduce side. Implementations must
/// give the same answer however the inputs were split between accumulators.
pub trait CombineFn<V, A, O>: Send + Sync + 'static {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: A) -> O;

    /// Fold every partial accumulator received for one key into one.
    fn merge_all(&self, accs: Vec<A>) -> A {
        let mut acc = self.create();
        for a in accs {
            self.merge(&mut acc, a);
        }
        acc
    }
}

/// Source collection over an owned vector.
pub fn from_vec<T: RFBound>(p: &Pipeline, data: Vec<T>) -> PCollection<T> {
    let id = p.insert_node(Node::Source {
        payload: Arc::new(data),
        vec_ops: vec_ops_for::<T>(),
        elem_tag: TypeTag::of::<T>(),
    });
    PCollection {
        pipeline: p.clone(),
        id,
        _t: PhantomData,
    }
}

/// Source collection over any finite iterator.
pub fn from_iter<T, I>(p: &Pipeline, iter: I) -> PCollection<T>
where
    T: RFBound,
    I: IntoIterator<Item = T>,
{
    from_vec(p, iter.into_iter().collect())
}

/* ---------- stateless operators ---------- */

pub(crate) struct MapOp<I, O, F>(pub F, pub PhantomData<(I, O)>);
impl<I, O, F> DynOp for MapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> O + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = take_vec::<I>(input, "map")?;
        let out: Vec<O> = v.iter().map(|i| (self.0)(i)).collect();
        Ok(Box::new(out))
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

pub(crate) struct FilterOp<T, P>(pub P, pub PhantomData<T>);
impl<T, P> DynOp for FilterOp<T, P>
where
    T: RFBound,
    P: Send + Sync + Fn(&T) -> bool + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = take_vec::<T>(input, "filter")?;
        Ok(Box::new(v.into_iter().filter(|t| (self.0)(t)).collect::<Vec<T>>()))
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}

pub(crate) struct FlatMapOp<I, O, F>(pub F, pub PhantomData<(I, O)>);
impl<I, O, F> DynOp for FlatMapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> Vec<O> + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = take_vec::<I>(input, "flat_map")?;
        let mut out: Vec<O> = Vec::with_capacity(v.len());
        for i in &v {
            out.extend((self.0)(i));
        }
        Ok(Box::new(out))
    }

    fn name(&self) -> &'static str {
        "flat_map"
    }
}

pub(crate) struct TryMapOp<I, O, F>(pub F, pub PhantomData<(I, O)>);
impl<I, O, F> DynOp for TryMapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> Result<O, TallyError> + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = take_vec::<I>(input, "try_map")?;
        let out = v.iter().map(|i| (self.0)(i)).collect::<Result<Vec<O>, _>>()?;
        Ok(Box::new(out))
    }

    fn name(&self) -> &'static str {
        "try_map"
    }
}

impl<T: RFBound> PCollection<T> {
    fn stateless<O>(self, op: Arc<dyn DynOp>) -> PCollection<O> {
        self.then(Node::Stateless(vec![op]))
    }

    pub fn map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> O,
    {
        self.stateless(Arc::new(MapOp::<T, O, F>(f, PhantomData)))
    }

    pub fn filter<F>(self, pred: F) -> PCollection<T>
    where
        F: 'static + Send + Sync + Fn(&T) -> bool,
    {
        self.stateless(Arc::new(FilterOp::<T, F>(pred, PhantomData)))
    }

    pub fn flat_map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Vec<O>,
    {
        self.stateless(Arc::new(FlatMapOp::<T, O, F>(f, PhantomData)))
    }

    /// Like [`map`](Self::map), but the first `Err` fails the whole run.
    ///
    /// Meant for parsing intermediate data, where a bad element means the
    /// upstream output is corrupt and skipping it would silently change the
    /// answer.
    pub fn try_map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Result<O, TallyError>,
    {
        self.stateless(Arc::new(TryMapOp::<T, O, F>(f, PhantomData)))
    }

    /// Execute with the given runner and materialize the result.
    pub fn collect_with(self, runner: &Runner) -> Result<Vec<T>> {
        runner.run_collect::<T>(&self.pipeline, self.id)
    }

    /// Execute on the calling thread as a single partition.
    pub fn collect_seq(self) -> Result<Vec<T>> {
        self.collect_with(&Runner {
            mode: ExecMode::Sequential,
            ..Runner::default()
        })
    }

    /// Execute on the rayon pool, split into `partitions` pieces.
    pub fn collect_par(self, threads: Option<usize>, partitions: Option<usize>) -> Result<Vec<T>> {
        self.collect_with(&Runner {
            mode: ExecMode::Parallel {
                threads,
                partitions,
            },
            ..Runner::default()
        })
    }
}
