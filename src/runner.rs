//! Plan execution, sequential or partitioned over the rayon pool.
//!
//! The runner walks the graph back from the requested terminal into a linear
//! chain, splits the source into partitions and pushes each partition through
//! the fused stateless operators independently. At every barrier
//! (`group_by_key`, `combine_values`, `combine_globally`) each partition runs
//! the barrier's map side and ships serialized partials; once every partition
//! is done, the reduce side sees all partials together, exactly once.

use crate::node::{DynOp, LocalFn, MergeFn, Node};
use crate::node_id::NodeId;
use crate::pipeline::Pipeline;
use crate::shuffle::Shuffled;
use crate::type_token::{Partition, take_vec};
use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::mem::take;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// How a plan is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// Single partition on the calling thread.
    Sequential,
    /// Partitions processed in parallel on a rayon pool.
    Parallel {
        /// Size of a dedicated pool; `None` uses the global one.
        threads: Option<usize>,
        /// Partition count; `None` uses [`Runner::default_partitions`].
        partitions: Option<usize>,
    },
}

/// How often the map side of a combine runs over one partition.
///
/// Every policy must produce the same final result; they only change how
/// much data crosses the barrier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CombinePolicy {
    /// Skip the combiner: every emission crosses the barrier on its own.
    Never,
    /// One combiner pass over the whole partition.
    #[default]
    Once,
    /// Combine each run of `n` consecutive emissions separately, as if the
    /// partition had been spilled to disk every `n` records.
    Spill(usize),
}

impl FromStr for CombinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "never" => Ok(Self::Never),
            "once" => Ok(Self::Once),
            other => {
                let n = other
                    .strip_prefix("spill:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        format!("unknown combine policy {other:?} (expected never, once or spill:N)")
                    })?;
                Ok(Self::Spill(n))
            }
        }
    }
}

impl Display for CombinePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Never => f.write_str("never"),
            Self::Once => f.write_str("once"),
            Self::Spill(n) => write!(f, "spill:{n}"),
        }
    }
}

impl TryFrom<String> for CombinePolicy {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CombinePolicy> for String {
    fn from(p: CombinePolicy) -> Self {
        p.to_string()
    }
}

/// Executes a pipeline up to a terminal node.
#[derive(Clone, Debug)]
pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
    pub combine: CombinePolicy,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: None,
                partitions: None,
            },
            default_partitions: 2 * num_cpus::get().max(2),
            combine: CombinePolicy::Once,
        }
    }
}

impl Runner {
    /// Execute the plan ending at `terminal` and materialize its elements.
    pub fn run_collect<T: Send + 'static>(&self, p: &Pipeline, terminal: NodeId) -> Result<Vec<T>> {
        let chain = linearize(p, terminal)?;
        match self.mode {
            ExecMode::Sequential => self.execute::<T>(chain, 1, false),
            ExecMode::Parallel {
                threads,
                partitions,
            } => {
                let parts = partitions.unwrap_or(self.default_partitions);
                match threads {
                    Some(t) => {
                        let pool = rayon::ThreadPoolBuilder::new()
                            .num_threads(t)
                            .build()
                            .context("build worker pool")?;
                        pool.install(|| self.execute::<T>(chain, parts, true))
                    }
                    None => self.execute::<T>(chain, parts, true),
                }
            }
        }
    }

    fn execute<T: Send + 'static>(&self, chain: Vec<Node>, parts: usize, parallel: bool) -> Result<Vec<T>> {
        let mut nodes = chain.into_iter();
        let Some(Node::Source {
            payload,
            vec_ops,
            elem_tag,
        }) = nodes.next()
        else {
            bail!("plan must start with a source node");
        };

        let len = vec_ops.len(payload.as_ref()).unwrap_or(0);
        let n = parts.max(1).min(len.max(1));
        let mut partitions = vec_ops
            .split(payload.as_ref(), n)
            .ok_or_else(|| anyhow!("source payload is not a Vec<{}>", elem_tag.name))?;
        debug!(
            source = elem_tag.name,
            elements = len,
            partitions = partitions.len(),
            combine = %self.combine,
            "executing plan"
        );

        // Stateless ops accumulate here until the next barrier, then run
        // fused inside each partition's task.
        let mut pending: Vec<Arc<dyn DynOp>> = Vec::new();
        for node in nodes {
            let kind = node.kind();
            match node {
                Node::Stateless(ops) => pending.extend(ops),
                Node::GroupByKey { local, merge }
                | Node::CombineValues { local, merge }
                | Node::CombineGlobal { local, merge } => {
                    let ops = take(&mut pending);
                    partitions = self.barrier(kind, partitions, &ops, &local, &merge, parallel)?;
                }
                Node::Source { .. } => bail!("unexpected additional source in plan"),
            }
        }

        if !pending.is_empty() {
            partitions = for_each_partition(partitions, parallel, |p| fuse(&pending, p))?;
        }

        let mut out = Vec::new();
        for part in partitions {
            out.extend(take_vec::<T>(part, "terminal")?);
        }
        Ok(out)
    }

    fn barrier(
        &self,
        kind: &'static str,
        partitions: Vec<Partition>,
        ops: &[Arc<dyn DynOp>],
        local: &LocalFn,
        merge: &MergeFn,
        parallel: bool,
    ) -> Result<Vec<Partition>> {
        let policy = self.combine;
        let shipped: Vec<Vec<Shuffled>> = for_each_partition(partitions, parallel, |p| {
            let p = fuse(ops, p)?;
            local(p, policy)
        })?;
        let blobs: Vec<Shuffled> = shipped.into_iter().flatten().collect();
        trace!(
            barrier = kind,
            partials = blobs.len(),
            bytes = blobs.iter().map(Vec::len).sum::<usize>(),
            "shuffle"
        );
        let merged = merge(blobs).with_context(|| format!("{kind} reduce"))?;
        Ok(vec![merged])
    }
}

/// Run a fused stateless stage over one partition.
fn fuse(ops: &[Arc<dyn DynOp>], input: Partition) -> Result<Partition> {
    ops.iter().try_fold(input, |acc, op| {
        op.apply(acc).with_context(|| format!("{} operator", op.name()))
    })
}

fn for_each_partition<R, F>(parts: Vec<Partition>, parallel: bool, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(Partition) -> Result<R> + Send + Sync,
{
    if parallel {
        parts.into_par_iter().map(f).collect()
    } else {
        parts.into_iter().map(f).collect()
    }
}

/// Walk back from `terminal` to its source and return the chain in run order.
fn linearize(p: &Pipeline, terminal: NodeId) -> Result<Vec<Node>> {
    let (mut nodes, edges) = p.snapshot();
    let mut chain = Vec::new();
    let mut cur = terminal;
    loop {
        let node = nodes
            .remove(&cur)
            .ok_or_else(|| anyhow!("missing node {cur:?}"))?;
        chain.push(node);
        match edges.iter().find(|(_, to)| *to == cur) {
            Some((from, _)) => cur = *from,
            None => break,
        }
    }
    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_policy_parses_its_own_display() {
        for p in [
            CombinePolicy::Never,
            CombinePolicy::Once,
            CombinePolicy::Spill(64),
        ] {
            assert_eq!(p.to_string().parse::<CombinePolicy>(), Ok(p));
        }
    }

    #[test]
    fn dedicated_pool_returns_the_collected_rows() -> Result<()> {
        let p = Pipeline::default();
        let runner = Runner {
            mode: ExecMode::Parallel {
                threads: Some(2),
                partitions: Some(3),
            },
            ..Runner::default()
        };
        let mut out = crate::from_vec(&p, vec![3u64, 1, 2])
            .map(|n: &u64| n * 2)
            .collect_with(&runner)?;
        out.sort_unstable();
        assert_eq!(out, vec![2, 4, 6]);
        Ok(())
    }

    #[test]
    fn combine_policy_rejects_zero_spill() {
        assert!("spill:0".parse::<CombinePolicy>().is_err());
        assert!("sometimes".parse::<CombinePolicy>().is_err());
    }
}
