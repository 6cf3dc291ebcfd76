//! The post-evaluation constraint checker.

use super::report::{CheckReport, Diagnostic};
use crate::computation::Ledger;
use crate::graph::{NodeId, NodeRegistry, OperationLedger, Tolerance, Value};
use log::debug;

/// Inspects an evaluation result against every bound expected value and every
/// recorded assertion, accumulating all violations rather than stopping at
/// the first. This pass never fails; it only reports.
pub struct ConstraintChecker<'a> {
    registry: &'a NodeRegistry,
    ops: &'a OperationLedger,
    tolerance: Tolerance,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(registry: &'a NodeRegistry, ops: &'a OperationLedger) -> Self {
        Self {
            registry,
            ops,
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn check(&self, ledger: &Ledger) -> CheckReport {
        let mut report = CheckReport::default();

        // 1. Expected-value bindings, in node creation order. Inputs and
        //    constants compare trivially equal to their own seeded values;
        //    expectations on derived nodes are the interesting cases.
        for idx in 0..self.registry.count() {
            let id = NodeId::new(idx);
            let Some(expected) = self.registry.binding(id) else {
                continue;
            };
            let Some(computed) = ledger.get(id) else {
                continue;
            };
            if !expected.approx_eq(computed, &self.tolerance) {
                report.push(Diagnostic::ValueMismatch {
                    node: self.registry.label(id).to_string(),
                    expected: *expected,
                    computed: *computed,
                });
            }
        }

        // 2. Assertions, in declaration order.
        for assertion in self.ops.assertions() {
            if matches!(ledger.get(assertion.result), Some(Value::Bool(true))) {
                continue;
            }
            let (Some(lhs_value), Some(rhs_value)) = (ledger.get(assertion.lhs), ledger.get(assertion.rhs)) else {
                continue;
            };
            report.push(Diagnostic::FailedAssertion {
                assertion: self.registry.label(assertion.result).to_string(),
                lhs: self.registry.label(assertion.lhs).to_string(),
                lhs_value: *lhs_value,
                rhs: self.registry.label(assertion.rhs).to_string(),
                rhs_value: *rhs_value,
            });
        }

        if !report.satisfied() {
            debug!("constraint check found {} violation(s)", report.diagnostics.len());
        }
        report
    }
}
