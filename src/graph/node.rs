//! Node identity: dense arena ids, per-graph tags, and the public handle.

use super::ops::OpId;
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique tag for one graph instance.
///
/// Node handles are arena indices, so an index alone cannot tell two graphs
/// apart. Membership checks compare this tag, which is what makes a handle
/// from one graph unusable in another even when the raw indices collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Dense index of a node within one graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// What a node is: a client-supplied input, an inline constant, or the
/// result of exactly one recorded operation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Created via `init`; must receive a bound value before evaluation.
    Input,
    /// Value fixed at creation, immutable thereafter.
    Constant(Value),
    /// Produced by the referenced operation.
    Derived(OpId),
}

/// Public handle to a node.
///
/// Cheap to clone; equality and hashing go by `(graph, id)` only. The label
/// is carried so that diagnostics can name a node even when it is presented
/// to a graph it does not belong to.
#[derive(Debug, Clone)]
pub struct Node {
    graph: GraphId,
    id: NodeId,
    label: Arc<str>,
}

impl Node {
    pub(crate) fn new(graph: GraphId, id: NodeId, label: &str) -> Self {
        Self {
            graph,
            id,
            label: Arc::from(label),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn graph(&self) -> GraphId {
        self.graph
    }

    /// The label the node was created with (its id's decimal form when unnamed).
    pub fn name(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph && self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}
