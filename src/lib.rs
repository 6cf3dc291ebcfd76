//! Computational graph builder and evaluator.
//!
//! Clients grow a DAG of value nodes and operations through a [`Builder`]
//! (addition, multiplication, equality assertions, and arbitrary "hint"
//! functions), then evaluate it once into a complete per-node value map and
//! check every declared expected value and assertion against it. Nothing
//! computes during construction; evaluation is deferred, runs each operation
//! exactly once in dependency order, and rebuilds the value map from scratch
//! on every call.
//!
//! Graphs are single-writer and single-threaded: one `Builder` owns one
//! graph for its lifetime, and nodes are never shared between graphs.

pub mod builder;
pub mod computation;
pub mod display;
pub mod graph;
pub mod validation;

pub use builder::{Builder, Operand};
pub use computation::{EvalError, Evaluator, Ledger};
pub use display::RenderError;
pub use graph::{
    Assertion, BuildError, HintFn, Node, NodeId, NodeKind, NodeRegistry, OpId, OpKind, OpRecord,
    OperationLedger, Tolerance, Value,
};
pub use validation::{CheckReport, ConstraintChecker, Diagnostic, FillWarning};
