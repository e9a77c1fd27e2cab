//! Execution plan: the compiler's output and its invariant checker.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::{PlanViolation, validate_plan};
