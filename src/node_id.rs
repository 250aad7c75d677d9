//! Identifiers for nodes in a [`Pipeline`](crate::pipeline::Pipeline) graph.

/// Sequential, opaque handle of one node in a pipeline graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const fn new(v: u64) -> Self {
        Self(v)
    }

    /// The underlying sequence number.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}
