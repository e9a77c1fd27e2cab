//! Entry node resolution.

use crate::ir::types::{ExecutorWarning, WarningCode};
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::Workflow;

/// Pick the node execution starts at.
///
/// The first trigger in node order wins. Without a trigger, the first node
/// with no incoming edges is used. Anything unusual is reported as a warning.
pub fn resolve_entry<'a>(
    workflow: &'a Workflow,
    graph: &WorkflowGraph<'a>,
    warnings: &mut Vec<ExecutorWarning>,
) -> Option<&'a str> {
    let trigger_count = workflow.triggers().count();
    if trigger_count > 1 {
        warnings.push(ExecutorWarning::new(
            WarningCode::MultipleTriggers,
            format!("Multiple triggers found ({trigger_count}). Using the first one."),
        ));
    }
    if let Some(trigger) = workflow.triggers().next() {
        return Some(trigger.id());
    }

    let root = workflow
        .nodes
        .iter()
        .find(|n| !graph.has_incoming(n.id()));
    if let Some(root) = root {
        return Some(root.id());
    }

    warnings.push(ExecutorWarning::new(
        WarningCode::NoEntry,
        "Could not determine an entry node (no trigger and no root).",
    ));
    None
}
