//! Columnar arena owning node identity, labels, and value bindings.

use super::node::{GraphId, Node, NodeId, NodeKind};
use super::value::Value;

/// Per-graph node store.
///
/// Identity is dense: the n-th `create` call returns `NodeId(n)`, and every
/// attribute lives in a column indexed by that id. Two calls never return the
/// same id within one graph instance. Membership is the authority for node
/// equality across graphs; see [`NodeRegistry::contains`].
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    graph: GraphId,

    // Columnar Arrays
    kinds: Vec<NodeKind>,
    /// Creation labels, immutable. Fallback is the id's decimal form.
    names: Vec<String>,
    /// Display labels; rewritten to "name = value" when a value is bound.
    labels: Vec<String>,
    /// Supplied input values and expectations. A `Constant` is bound at
    /// creation; an `Input` stays unbound until filled; a binding on a
    /// `Derived` node is an expectation, never an override.
    bound: Vec<Option<Value>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            graph: GraphId::next(),
            kinds: Vec::new(),
            names: Vec::new(),
            labels: Vec::new(),
            bound: Vec::new(),
        }
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph
    }

    pub fn count(&self) -> usize {
        self.kinds.len()
    }

    pub fn create(&mut self, kind: NodeKind, label: Option<&str>) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        let name = match label {
            Some(l) => l.to_string(),
            None => id.0.to_string(),
        };

        // Constants carry their value as a binding from the start, so the
        // checker can compare them uniformly with inputs and expectations.
        let binding = match &kind {
            NodeKind::Constant(v) => Some(*v),
            _ => None,
        };

        self.kinds.push(kind);
        self.labels.push(name.clone());
        self.names.push(name);
        self.bound.push(binding);
        id
    }

    /// Builds the public handle for an id in this graph.
    pub fn handle(&self, id: NodeId) -> Node {
        Node::new(self.graph, id, &self.names[id.index()])
    }

    /// True iff the handle was created by this registry.
    pub fn contains(&self, node: &Node) -> bool {
        node.graph() == self.graph && node.id().index() < self.kinds.len()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.index()]
    }

    /// Display label: the creation label, or "name = value" once bound.
    pub fn label(&self, id: NodeId) -> &str {
        &self.labels[id.index()]
    }

    pub fn binding(&self, id: NodeId) -> Option<&Value> {
        self.bound[id.index()].as_ref()
    }

    /// Binds or overwrites a value on a node and rewrites its display label.
    ///
    /// For an `Input` this is the supplied value; for anything else it is an
    /// expectation checked after evaluation.
    pub fn bind(&mut self, id: NodeId, value: Value) {
        let idx = id.index();
        self.labels[idx] = format!("{} = {}", self.names[idx], value);
        self.bound[idx] = Some(value);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
