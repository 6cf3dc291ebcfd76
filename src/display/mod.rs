//! Read-only renderings of a built graph.
pub mod dot;

pub use dot::{render, write_graph, RenderError};
