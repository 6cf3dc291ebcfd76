//! Defines the core data structures for the computation graph.
pub mod node;
pub mod ops;
pub mod registry;
pub mod value;

// Re-export key types for convenient access
pub use node::{GraphId, Node, NodeId, NodeKind};
pub use ops::{Assertion, BuildError, HintFn, OpId, OpKind, OpRecord, OperationLedger};
pub use registry::NodeRegistry;
pub use value::{Tolerance, Value};
