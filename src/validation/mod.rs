//! Post-evaluation constraint checking and its structured diagnostics.

pub use self::checker::ConstraintChecker;
pub use self::report::{CheckReport, Diagnostic, FillWarning};

mod checker;
mod report;
