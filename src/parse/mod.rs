//! Parse phase: JSON → Rust types + graph construction.

pub mod graph;
pub mod lenient;
pub mod types;

pub use graph::WorkflowGraph;
pub use types::*;

use crate::error::WorkflowError;

/// Deserialize a workflow JSON string (`{nodes, edges}`) into a `Workflow`.
pub fn parse(json: &str) -> Result<Workflow, WorkflowError> {
    serde_json::from_str::<Workflow>(json).map_err(WorkflowError::Parse)
}

/// Parse JSON and hand the snapshot to `f` together with its graph.
///
/// The graph borrows the workflow, so it cannot outlive this call.
pub fn parse_and_build<T>(
    json: &str,
    f: impl FnOnce(&Workflow, &WorkflowGraph<'_>) -> T,
) -> Result<T, WorkflowError> {
    let workflow = parse(json)?;
    let graph = WorkflowGraph::build(&workflow);
    Ok(f(&workflow, &graph))
}
