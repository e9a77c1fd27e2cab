#![allow(dead_code)]

use flowgraph::parse::types::*;
use flowgraph::validate::ValidationIssue;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Graph builders
// =============================================================================

/// Node with its editor defaults (label and config).
pub fn node(node_type: NodeType, id: &str) -> WorkflowNode {
    WorkflowNode::new(node_type, id, Position::default())
}

/// Node with an explicit config object, built through the JSON path.
pub fn configured(node_type: NodeType, id: &str, config: Value) -> WorkflowNode {
    serde_json::from_value(json!({
        "id": id,
        "type": node_type.as_str(),
        "position": { "x": 0, "y": 0 },
        "data": { "label": node_type.default_label(), "config": config },
    }))
    .expect("node JSON should deserialize")
}

pub fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge::new(id, source, target)
}

/// Condition edge on the `if` or `else` handle.
pub fn branch_edge(id: &str, source: &str, target: &str, handle: &str) -> WorkflowEdge {
    WorkflowEdge::new(id, source, target).with_source_handle(handle)
}

pub fn workflow(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Workflow {
    Workflow::new(nodes, edges)
}

/// trigger → audience → sms, every node configured so the graph validates.
pub fn valid_chain() -> Workflow {
    workflow(
        vec![
            node(NodeType::Trigger, "t1"),
            node(NodeType::Audience, "a1"),
            configured(NodeType::Sms, "s1", json!({ "text": "hello" })),
        ],
        vec![edge("e1", "t1", "a1"), edge("e2", "a1", "s1")],
    )
}

// =============================================================================
// Fixtures & assertions
// =============================================================================

pub fn load(json: &str) -> Workflow {
    flowgraph::parse::parse(json).expect("fixture should parse")
}

pub fn keys(issues: &[ValidationIssue]) -> Vec<&str> {
    issues.iter().map(|i| i.message_key.as_str()).collect()
}

/// `(id, messageKey)` pairs, with `"-"` for workflow-level issues.
pub fn located(issues: &[ValidationIssue]) -> Vec<(&str, &str)> {
    issues
        .iter()
        .map(|i| (i.id.as_deref().unwrap_or("-"), i.message_key.as_str()))
        .collect()
}
