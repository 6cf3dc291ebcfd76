//! The stateful facade clients use to grow and run one graph.

use crate::computation::{EvalError, Evaluator, Ledger};
use crate::display::dot;
use crate::display::RenderError;
use crate::graph::{
    Assertion, BuildError, Node, NodeId, NodeKind, NodeRegistry, OpKind, OperationLedger, Tolerance, Value,
};
use crate::validation::{CheckReport, ConstraintChecker, FillWarning};
use log::warn;
use smallvec::{smallvec, SmallVec};
use std::path::Path;
use std::sync::Arc;

/// Something usable as an operation operand: an existing node, or a literal
/// that will be promoted to a fresh constant node labeled with its textual
/// form.
#[derive(Debug, Clone)]
pub enum Operand {
    Node(Node),
    Literal(Value),
}

impl From<&Node> for Operand {
    fn from(node: &Node) -> Self {
        Operand::Node(node.clone())
    }
}

impl From<Node> for Operand {
    fn from(node: Node) -> Self {
        Operand::Node(node)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Literal(Value::Int(v))
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Literal(Value::Int(v as i64))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Literal(Value::Float(v))
    }
}

/// Computational graph builder supporting addition, multiplication, equality
/// assertions between nodes, and "hints" that run arbitrary client functions
/// in the graph.
///
/// Construction is deferred: nothing computes until [`Builder::evaluate`] (or
/// [`Builder::check_constraints`], which evaluates first). Evaluation never
/// mutates the graph, and re-evaluating always rebuilds the full value map
/// from the current ledger state; growing the graph after an evaluation is
/// technically possible but not the supported contract.
///
/// Every construction method accepts optional display labels through its
/// `_labeled` variant; labels feed diagnostics and rendering, never identity.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    registry: NodeRegistry,
    ops: OperationLedger,
    tolerance: Tolerance,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the numeric comparison tolerance used by `assert_equal` and
    /// the constraint checker.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn node_count(&self) -> usize {
        self.registry.count()
    }

    pub fn operation_count(&self) -> usize {
        self.ops.len()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn operations(&self) -> &OperationLedger {
        &self.ops
    }

    // --- Construction ---

    /// Creates an input node whose value must be supplied via `fill_values`
    /// before the graph runs.
    pub fn init(&mut self) -> Node {
        self.create_node(NodeKind::Input, None)
    }

    pub fn init_labeled(&mut self, label: &str) -> Node {
        self.create_node(NodeKind::Input, Some(label))
    }

    /// Creates a node with a fixed value, labeled with the value's textual
    /// form unless overridden.
    pub fn constant(&mut self, value: impl Into<Value>) -> Node {
        let value = value.into();
        self.create_node(NodeKind::Constant(value), Some(&value.to_string()))
    }

    pub fn constant_labeled(&mut self, value: impl Into<Value>, label: &str) -> Node {
        self.create_node(NodeKind::Constant(value.into()), Some(label))
    }

    /// Records an addition and returns its result node.
    pub fn add(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<Node, BuildError> {
        self.binary(OpKind::Add, a.into(), b.into(), None, None)
    }

    pub fn add_labeled(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
        label: Option<&str>,
        op_label: Option<&str>,
    ) -> Result<Node, BuildError> {
        self.binary(OpKind::Add, a.into(), b.into(), label, op_label)
    }

    /// Records a multiplication and returns its result node.
    pub fn mul(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<Node, BuildError> {
        self.binary(OpKind::Mul, a.into(), b.into(), None, None)
    }

    pub fn mul_labeled(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
        label: Option<&str>,
        op_label: Option<&str>,
    ) -> Result<Node, BuildError> {
        self.binary(OpKind::Mul, a.into(), b.into(), label, op_label)
    }

    /// Records an equality assertion between two operands. The returned node
    /// holds the boolean outcome; the pair is also registered for the
    /// constraint checker so failures name both sides.
    pub fn assert_equal(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<Node, BuildError> {
        self.assert_equal_labeled(a, b, None, None)
    }

    pub fn assert_equal_labeled(
        &mut self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
        label: Option<&str>,
        op_label: Option<&str>,
    ) -> Result<Node, BuildError> {
        let node = self.binary(OpKind::AssertEq, a.into(), b.into(), label, op_label)?;
        // binary() appended the operation last; read back its (possibly
        // promoted) operand ids for the assertion table.
        let (result, lhs, rhs) = {
            let record = &self.ops.records()[self.ops.len() - 1];
            (record.result, record.operands[0], record.operands[1])
        };
        self.ops.record_assertion(Assertion { result, lhs, rhs });
        Ok(node)
    }

    /// Records a call of an arbitrary client function over the bound values
    /// of `operands`, in order, at evaluation time. The function is opaque to
    /// the graph and must be pure for results to be deterministic.
    pub fn hint<F>(&mut self, f: F, operands: &[Operand]) -> Result<Node, BuildError>
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        self.hint_labeled(f, operands, None, None)
    }

    pub fn hint_labeled<F>(
        &mut self,
        f: F,
        operands: &[Operand],
        label: Option<&str>,
        op_label: Option<&str>,
    ) -> Result<Node, BuildError>
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        let op_display = op_label.unwrap_or("hint");
        if operands.is_empty() {
            return Err(BuildError::EmptyOperands {
                operation: op_display.to_string(),
            });
        }
        self.check_operands(operands, op_display)?;

        let operand_ids: SmallVec<[NodeId; 2]> =
            operands.iter().map(|o| self.resolve_operand(o.clone())).collect();
        let result = self.create_node(NodeKind::Derived(self.ops.next_id()), label);
        self.ops
            .record(operand_ids, result.id(), OpKind::Hint(Arc::new(f)), op_label)?;
        Ok(result)
    }

    // --- Values and execution ---

    /// Binds values onto nodes, one entry at a time.
    ///
    /// Binding an input supplies (or overwrites) its value; binding a
    /// constant or an operation result declares an expected value checked
    /// after evaluation, never an override. An entry whose node belongs to a
    /// different graph is skipped with a warning and the remaining entries
    /// still proceed.
    pub fn fill_values(&mut self, entries: &[(&Node, Value)]) -> Vec<FillWarning> {
        let mut warnings = Vec::new();
        for (node, value) in entries {
            if let Some(warning) = self.fill_value(node, *value) {
                warnings.push(warning);
            }
        }
        warnings
    }

    pub fn fill_value(&mut self, node: &Node, value: impl Into<Value>) -> Option<FillWarning> {
        if !self.registry.contains(node) {
            let warning = FillWarning {
                node: node.name().to_string(),
            };
            warn!("{}", warning);
            return Some(warning);
        }
        self.registry.bind(node.id(), value.into());
        None
    }

    /// Runs the graph once, producing a value for every node, or a blocking
    /// error. The value map is rebuilt from scratch on every call.
    pub fn evaluate(&self) -> Result<Ledger, EvalError> {
        Evaluator::new(&self.registry, &self.ops)
            .with_tolerance(self.tolerance)
            .evaluate()
    }

    /// Evaluates, then checks every expected value and assertion, returning
    /// all violations. Evaluation-blocking problems surface as the error.
    pub fn check_constraints(&self) -> Result<CheckReport, EvalError> {
        let ledger = self.evaluate()?;
        Ok(ConstraintChecker::new(&self.registry, &self.ops)
            .with_tolerance(self.tolerance)
            .check(&ledger))
    }

    // --- Rendering ---

    /// The graph as Graphviz DOT text.
    pub fn to_dot(&self) -> String {
        dot::render(&self.registry, &self.ops)
    }

    /// Writes the graph to `path`; the extension selects the encoding.
    pub fn write_graph(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        dot::write_graph(&self.registry, &self.ops, path.as_ref())
    }

    // --- Internals ---

    fn create_node(&mut self, kind: NodeKind, label: Option<&str>) -> Node {
        let id = self.registry.create(kind, label);
        self.registry.handle(id)
    }

    /// Rejects any node operand that does not belong to this graph. Runs
    /// before literal promotion so a failed call records nothing at all.
    fn check_operands(&self, operands: &[Operand], op_display: &str) -> Result<(), BuildError> {
        for operand in operands {
            if let Operand::Node(node) = operand {
                if !self.registry.contains(node) {
                    return Err(BuildError::UnknownOperand {
                        operand: node.name().to_string(),
                        operation: op_display.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn resolve_operand(&mut self, operand: Operand) -> NodeId {
        match operand {
            Operand::Node(node) => node.id(),
            Operand::Literal(value) => self.constant(value).id(),
        }
    }

    fn binary(
        &mut self,
        kind: OpKind,
        a: Operand,
        b: Operand,
        label: Option<&str>,
        op_label: Option<&str>,
    ) -> Result<Node, BuildError> {
        let op_display = op_label.unwrap_or_else(|| kind.name());
        self.check_operands(&[a.clone(), b.clone()], op_display)?;

        let a_id = self.resolve_operand(a);
        let b_id = self.resolve_operand(b);
        let result = self.create_node(NodeKind::Derived(self.ops.next_id()), label);
        self.ops
            .record(smallvec![a_id, b_id], result.id(), kind, op_label)?;
        Ok(result)
    }
}
