//! Executes the computation graph.
pub mod engine;
pub mod ledger;

pub use engine::Evaluator;
pub use ledger::{EvalError, Ledger};
