//! ledger.rs
//! Dense per-evaluation value storage and the evaluation error taxonomy.

use crate::graph::{Node, NodeId, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("No operations in graph. Cannot run graph without any operations defined.")]
    EmptyGraph,
    #[error("Node {label} is undefined. Must define node before running the graph.")]
    UndefinedNode { label: String },
    #[error("Hint '{label}' failed: {message}")]
    HintFailed { label: String, message: String },
    #[error("Operation '{operation}' cannot combine {lhs} and {rhs}")]
    OperandType {
        operation: String,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Integer overflow while computing node '{label}'")]
    Overflow { label: String },
    #[error("Cycle detected involving node '{label}'")]
    CycleDetected { label: String },
}

/// The value map produced by one evaluation pass.
///
/// Dense storage keyed by `NodeId`; rebuilt from scratch on every evaluation,
/// never cached across calls. A ledger is only handed out complete: every
/// node of the graph holds exactly one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    values: Vec<Option<Value>>,
}

impl Ledger {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            values: vec![None; size],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, node_id: NodeId) -> Option<&Value> {
        self.values.get(node_id.index())?.as_ref()
    }

    /// Convenience lookup through a public handle.
    pub fn value(&self, node: &Node) -> Option<&Value> {
        self.get(node.id())
    }

    #[inline(always)]
    pub(crate) fn insert(&mut self, node_id: NodeId, value: Value) {
        let idx = node_id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }

    /// True iff every slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut ledger = Ledger::with_capacity(2);
        ledger.insert(NodeId(0), Value::Int(1));
        assert_eq!(ledger.get(NodeId(0)), Some(&Value::Int(1)));
        assert_eq!(ledger.get(NodeId(1)), None);
        assert!(!ledger.is_complete());

        ledger.insert(NodeId(1), Value::Float(0.5));
        assert!(ledger.is_complete());
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let ledger = Ledger::with_capacity(1);
        assert_eq!(ledger.get(NodeId(7)), None);
    }
}
