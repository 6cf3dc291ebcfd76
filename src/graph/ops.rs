//! The append-only operation ledger: the edges of the DAG.

use super::node::NodeId;
use super::value::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Dense index of an operation within one graph's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OpId(pub u32);

impl OpId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn new(idx: usize) -> Self {
        Self(idx as u32)
    }
}

/// An opaque client-supplied function evaluated over operand values in order.
///
/// Must be pure for evaluation to stay deterministic; an `Err` aborts the
/// whole evaluation pass.
pub type HintFn = Arc<dyn Fn(&[Value]) -> Result<Value, String>>;

/// The calculation a recorded operation performs.
///
/// A tagged variant rather than a trait object, so the evaluator dispatches
/// without runtime type inspection. `Hint` carries the opaque function.
#[derive(Clone)]
pub enum OpKind {
    Add,
    Mul,
    AssertEq,
    Hint(HintFn),
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Mul => "mul",
            OpKind::AssertEq => "equal",
            OpKind::Hint(_) => "hint",
        }
    }
}

impl fmt::Debug for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hint closures have no useful Debug form.
        f.write_str(self.name())
    }
}

/// One recorded operation: ordered operands in, exactly one result out.
#[derive(Debug, Clone)]
pub struct OpRecord {
    pub id: OpId,
    /// Display label; defaults to "<kind><id>" (add0, hint2, ...).
    pub label: String,
    pub operands: SmallVec<[NodeId; 2]>,
    pub result: NodeId,
    pub kind: OpKind,
}

/// An equality assertion registered by `assert_equal`, kept with both operand
/// ids so failures can name and show each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion {
    pub result: NodeId,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The operand handle does not belong to this graph. Fatal to the single
    /// construction call; nothing is recorded.
    #[error("Node {operand} isn't in graph. Unable to add the {operation} operation.")]
    UnknownOperand { operand: String, operation: String },
    /// A node may be the result of at most one operation.
    #[error("Node {result} is already the result of another operation. Unable to add the {operation} operation.")]
    DuplicateResult { result: u32, operation: String },
    /// Hints take a positive-length operand list.
    #[error("The {operation} operation requires at least one operand.")]
    EmptyOperands { operation: String },
    /// Fixed-arity kinds take exactly the operand count their kind declares.
    #[error("The {operation} operation takes exactly {expected} operands, got {actual}.")]
    OperandArity {
        operation: String,
        expected: usize,
        actual: usize,
    },
}

/// Append-only record of every operation declared on a graph, in declaration
/// order, plus the assertion side-table.
#[derive(Debug, Clone, Default)]
pub struct OperationLedger {
    pub(crate) records: Vec<OpRecord>,
    assertions: Vec<Assertion>,
    result_nodes: HashSet<NodeId>,
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next successful `record` call will assign.
    pub fn next_id(&self) -> OpId {
        OpId(self.records.len() as u32)
    }

    /// Appends an operation. All-or-nothing: on error nothing is recorded.
    ///
    /// Operand membership is the caller's responsibility (the registry owns
    /// it); this enforces the ledger-local invariants.
    pub fn record(
        &mut self,
        operands: SmallVec<[NodeId; 2]>,
        result: NodeId,
        kind: OpKind,
        label: Option<&str>,
    ) -> Result<OpId, BuildError> {
        let id = OpId(self.records.len() as u32);
        let label = match label {
            Some(l) => l.to_string(),
            None => format!("{}{}", kind.name(), id.0),
        };

        if operands.is_empty() {
            return Err(BuildError::EmptyOperands { operation: label });
        }
        // Binary kinds have their arity fixed; only hints are variadic.
        if !matches!(kind, OpKind::Hint(_)) && operands.len() != 2 {
            return Err(BuildError::OperandArity {
                operation: label,
                expected: 2,
                actual: operands.len(),
            });
        }
        if !self.result_nodes.insert(result) {
            return Err(BuildError::DuplicateResult {
                result: result.0,
                operation: label,
            });
        }

        self.records.push(OpRecord {
            id,
            label,
            operands,
            result,
            kind,
        });
        Ok(id)
    }

    pub fn record_assertion(&mut self, assertion: Assertion) {
        self.assertions.push(assertion);
    }

    pub fn records(&self) -> &[OpRecord] {
        &self.records
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn get(&self, id: OpId) -> Option<&OpRecord> {
        self.records.get(id.index())
    }
}
