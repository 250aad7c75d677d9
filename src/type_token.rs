//! Type-erased partition buffers and the helpers that move them around.
//!
//! Intermediate results travel between nodes as opaque [`Partition`] boxes.
//! Each node knows the concrete `Vec<T>` it expects and recovers it with
//! [`take_vec`]; a mismatch means the plan handed a node somebody else's data,
//! which is reported as [`TallyError::InvalidPartialResult`] instead of a panic.
//!
//! [`VecOps`] lets the runner size and split a `Source` payload without
//! knowing its element type.

use crate::error::TallyError;
use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

/// A partition buffer carried between nodes at runtime.
pub type Partition = Box<dyn Any + Send + Sync>;

/// Runtime identity of a source's element type, kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Unbox a partition as `Vec<T>`, naming `stage` in the error on mismatch.
pub(crate) fn take_vec<T: 'static>(part: Partition, stage: &str) -> Result<Vec<T>, TallyError> {
    part.downcast::<Vec<T>>().map(|v| *v).map_err(|_| {
        TallyError::partial(stage, format!("expected a Vec<{}>", type_name::<T>()))
    })
}

/// Type-erased helpers for a source's `Vec<T>`.
pub trait VecOps: Send + Sync {
    /// Number of elements if `data` is the expected `Vec<T>`.
    fn len(&self, data: &dyn Any) -> Option<usize>;

    /// Split `data` into at most `n` contiguous, order-preserving partitions.
    ///
    /// Every returned partition owns its elements; nothing is shared with
    /// the source payload or with sibling partitions.
    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>>;
}

struct VecOpsImpl<T>(PhantomData<T>);

impl<T: Clone + Send + Sync + 'static> VecOps for VecOpsImpl<T> {
    fn len(&self, data: &dyn Any) -> Option<usize> {
        data.downcast_ref::<Vec<T>>().map(Vec::len)
    }

    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>> {
        let v = data.downcast_ref::<Vec<T>>()?;
        if n <= 1 || v.len() <= 1 {
            return Some(vec![Box::new(v.clone())]);
        }
        let chunk = v.len().div_ceil(n);
        Some(
            v.chunks(chunk)
                .map(|c| Box::new(c.to_vec()) as Partition)
                .collect(),
        )
    }
}

/// Create the type-erased [`VecOps`] for `Vec<T>`.
#[must_use]
pub fn vec_ops_for<T: Clone + Send + Sync + 'static>() -> Arc<dyn VecOps> {
    Arc::new(VecOpsImpl::<T>(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_every_element_once() {
        let ops = vec_ops_for::<u32>();
        let data: Vec<u32> = (0..10).collect();
        let parts = ops.split(&data, 3).expect("u32 payload");
        assert_eq!(parts.len(), 3);
        let mut seen = Vec::new();
        for p in parts {
            seen.extend(take_vec::<u32>(p, "test").expect("u32 partition"));
        }
        assert_eq!(seen, data);
    }

    #[test]
    fn wrong_payload_is_an_invalid_partial() {
        let part: Partition = Box::new(vec!["x".to_string()]);
        let err = take_vec::<u64>(part, "combine merge").unwrap_err();
        assert!(matches!(err, TallyError::InvalidPartialResult { .. }));
        assert_eq!(vec_ops_for::<u64>().len(&vec!["x".to_string()]), None);
    }
}
