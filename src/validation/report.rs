//! Structured diagnostics from the constraint-checking pass.

use crate::graph::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One constraint violation found after evaluation.
///
// A structured record rather than a formatted string, so callers can inspect
// findings programmatically instead of matching on messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A bound expected value differs from the computed value.
    ValueMismatch {
        node: String,
        expected: Value,
        computed: Value,
    },
    /// An equality assertion came out false.
    FailedAssertion {
        assertion: String,
        lhs: String,
        lhs_value: Value,
        rhs: String,
        rhs_value: Value,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ValueMismatch {
                node,
                expected,
                computed,
            } => write!(
                f,
                "Node {} has an expected value of {}, but this does not match the calculated value of {}",
                node, expected, computed
            ),
            Diagnostic::FailedAssertion {
                assertion,
                lhs,
                lhs_value,
                rhs,
                rhs_value,
            } => write!(
                f,
                "Node {} has failed assertion that node {} ({}) and node {} ({}) are equal.",
                assertion, lhs, lhs_value, rhs, rhs_value
            ),
        }
    }
}

/// Everything the checker found in one pass. Empty means satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn satisfied(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.satisfied() {
            return write!(f, "all constraints satisfied");
        }
        for (i, d) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// A `fill_values` entry that was skipped because its node belongs to a
/// different graph. Non-fatal; the remaining entries still proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillWarning {
    pub node: String,
}

impl fmt::Display for FillWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {} isn't in graph. Cannot set its value.", self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_wording() {
        let d = Diagnostic::ValueMismatch {
            node: "x + 1 = 3".into(),
            expected: Value::Int(3),
            computed: Value::Int(2),
        };
        assert_eq!(
            d.to_string(),
            "Node x + 1 = 3 has an expected value of 3, but this does not match the calculated value of 2"
        );
    }

    #[test]
    fn test_assertion_message_includes_both_operands() {
        let d = Diagnostic::FailedAssertion {
            assertion: "assert 1 + 1 = 3".into(),
            lhs: "x + 1".into(),
            lhs_value: Value::Int(2),
            rhs: "3".into(),
            rhs_value: Value::Int(3),
        };
        let msg = d.to_string();
        assert!(msg.contains("has failed assertion"));
        assert!(msg.contains("x + 1 (2)"));
        assert!(msg.contains("3 (3)"));
    }

    #[test]
    fn test_report_serializes_to_json_and_back() {
        let report = CheckReport {
            diagnostics: vec![Diagnostic::ValueMismatch {
                node: "r".into(),
                expected: Value::Float(3.0),
                computed: Value::Int(2),
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("value_mismatch"));
        let back: CheckReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
