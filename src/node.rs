use crate::runner::CombinePolicy;
use crate::shuffle::Shuffled;
use crate::type_token::{Partition, TypeTag, VecOps};
use anyhow::Result;
use std::any::Any;
use std::sync::Arc;

/// An element-wise operator over one partition.
pub trait DynOp: Send + Sync {
    fn apply(&self, input: Partition) -> Result<Partition>;

    /// Short label for plan logging.
    fn name(&self) -> &'static str;
}

/// Map side of a barrier: one input partition → zero or more shuffled blobs.
///
/// The policy decides how often the combine step runs over the partition.
pub(crate) type LocalFn =
    Arc<dyn Fn(Partition, CombinePolicy) -> Result<Vec<Shuffled>> + Send + Sync>;

/// Reduce side of a barrier: every blob from every partition → one partition.
pub(crate) type MergeFn = Arc<dyn Fn(Vec<Shuffled>) -> Result<Partition> + Send + Sync>;

#[derive(Clone)]
pub enum Node {
    Source {
        payload: Arc<dyn Any + Send + Sync>,
        vec_ops: Arc<dyn VecOps>,
        elem_tag: TypeTag,
    },
    Stateless(Vec<Arc<dyn DynOp>>),

    /// `Vec<(K, V)>` → `Vec<(K, Vec<V>)>`
    GroupByKey { local: LocalFn, merge: MergeFn },

    /// `Vec<(K, V)>` → `Vec<(K, O)>` through a keyed `CombineFn`
    CombineValues { local: LocalFn, merge: MergeFn },

    /// `Vec<T>` → a single `O` through an unkeyed `CombineFn`
    CombineGlobal { local: LocalFn, merge: MergeFn },
}

impl Node {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Stateless(_) => "stateless",
            Self::GroupByKey { .. } => "group_by_key",
            Self::CombineValues { .. } => "combine_values",
            Self::CombineGlobal { .. } => "combine_globally",
        }
    }
}
