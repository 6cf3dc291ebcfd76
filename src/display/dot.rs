//! Graphviz rendering of the node set and operation ledger.
//!
//! Operations are drawn as distinct vertices, not just edges: every operand
//! points at its operation, and the operation points at its result. Data
//! nodes are boxes, operations are circles, labels come from the display
//! label map (so bound nodes show "name = value").

use crate::graph::{NodeId, NodeRegistry, OperationLedger};
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown file format for saving graph: {extension}")]
    UnsupportedExtension { extension: String },
    #[error("graphviz 'dot' failed: {detail}")]
    Graphviz { detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders the graph to DOT text.
pub fn render(registry: &NodeRegistry, ops: &OperationLedger) -> String {
    let mut out = String::from("digraph g {\n");

    // Draw data nodes
    for idx in 0..registry.count() {
        let id = NodeId::new(idx);
        let _ = writeln!(
            out,
            "    n{} [label=\"{}\", shape=rect];",
            id.0,
            escape(registry.label(id))
        );
    }

    // Draw operation vertices and their edges
    for record in ops.records() {
        let _ = writeln!(
            out,
            "    op{} [label=\"{}\", shape=circle];",
            record.id.0,
            escape(&record.label)
        );
        for operand in &record.operands {
            let _ = writeln!(out, "    n{} -> op{};", operand.0, record.id.0);
        }
        let _ = writeln!(out, "    op{} -> n{};", record.id.0, record.result.0);
    }

    out.push_str("}\n");
    out
}

/// Writes the graph to `path`; the extension selects the encoding.
///
/// `.dot` is written directly; `.png`, `.jpg`, `.jpeg`, `.svg` and `.pdf`
/// are produced by piping the DOT text through the `dot` executable. Any
/// other extension is a caller error, never a silent fallback.
pub fn write_graph(registry: &NodeRegistry, ops: &OperationLedger, path: &Path) -> Result<(), RenderError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let source = render(registry, ops);
    match extension.as_str() {
        "dot" => {
            fs::write(path, source)?;
            Ok(())
        }
        "png" | "jpg" | "jpeg" | "svg" | "pdf" => pipe_through_dot(&source, &extension, path),
        _ => Err(RenderError::UnsupportedExtension {
            extension: format!(".{}", extension),
        }),
    }
}

fn pipe_through_dot(source: &str, format: &str, path: &Path) -> Result<(), RenderError> {
    let mut child = Command::new("dot")
        .arg(format!("-T{}", format))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(source.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(RenderError::Graphviz {
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
