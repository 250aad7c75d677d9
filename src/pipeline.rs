use crate::node::Node;
use crate::node_id::NodeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Container for a job's computation graph.
///
/// Cloning is cheap: clones share the same graph, which is how every
/// [`PCollection`](crate::PCollection) derived from a source keeps appending
/// to one plan.
#[derive(Clone, Default)]
pub struct Pipeline {
    pub(crate) inner: Arc<Mutex<PipelineInner>>,
}

#[derive(Default)]
pub(crate) struct PipelineInner {
    pub(crate) next_id: u64,
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) edges: Vec<(NodeId, NodeId)>,
}

impl Pipeline {
    // Nodes are only ever inserted whole, so a poisoned lock still guards a
    // consistent graph.
    fn lock(&self) -> MutexGuard<'_, PipelineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_node(&self, node: Node) -> NodeId {
        let mut g = self.lock();
        let id = NodeId::new(g.next_id);
        g.next_id += 1;
        g.nodes.insert(id, node);
        id
    }

    pub(crate) fn connect(&self, from: NodeId, to: NodeId) {
        self.lock().edges.push((from, to));
    }

    /// Copy of the graph as it stands, for the runner to plan from.
    pub(crate) fn snapshot(&self) -> (HashMap<NodeId, Node>, Vec<(NodeId, NodeId)>) {
        let g = self.lock();
        (g.nodes.clone(), g.edges.clone())
    }

    /// Number of nodes inserted so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }
}
