pub mod document;
pub mod error;
pub mod ir;
pub mod lower;
pub mod parse;
pub mod rules;
pub mod validate;
pub mod wasm;

pub use document::{WorkflowDocument, WorkflowStatus, WorkflowSummary};
pub use error::WorkflowError;
pub use ir::{ExecutionPlan, validate_plan};
pub use lower::build_workflow_execution;
pub use parse::types::{Workflow, WorkflowEdge, WorkflowNode};
pub use validate::{validate_connection, validate_workflow};
