//! Validation phase.
//!
//! Two validators share the rule tables in `crate::rules`:
//! - `connection`: incremental gate for a single proposed edge,
//! - `validate_workflow`: batch check of a whole graph before save/run.

pub mod connection;
pub mod issue;
pub mod node_rules;
pub mod structural;

pub use connection::{Connection, ConnectionRejection, ConnectionVerdict, validate_connection};
pub use issue::{IssueTarget, Severity, ValidationIssue, WorkflowValidation};

use tracing::debug;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{Workflow, WorkflowNode};

/// Validate the entire workflow graph (structural + node configs).
///
/// Never short-circuits: every check runs and all issues are returned, in
/// check order and then graph order.
pub fn validate_workflow(workflow: &Workflow) -> WorkflowValidation {
    let graph = WorkflowGraph::build(workflow);
    let mut issues = structural::validate_structural(workflow, &graph);

    for node in &workflow.nodes {
        issues.extend(validate_node(node));
    }

    let result = WorkflowValidation::from_issues(issues);
    debug!(
        nodes = workflow.nodes.len(),
        edges = workflow.edges.len(),
        issues = result.issues.len(),
        valid = result.valid,
        "validated workflow"
    );
    result
}

/// Validate a single node's configuration.
pub fn validate_node(node: &WorkflowNode) -> Vec<ValidationIssue> {
    node_rules::validate_node_config(node)
}
