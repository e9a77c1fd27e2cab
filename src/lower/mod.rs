//! Lowering phase: Workflow → ExecutionPlan.
//!
//! Compiles the editor graph into the ordered, typed plan a runner follows.
//! Total: any graph compiles, and anomalies become warnings on the plan.
//! SYNC NOTE: When node types/configs change in `parse/types.rs`, re-check
//! `builder` for full coverage.

pub mod builder;
pub mod entry;
pub mod ordering;
pub mod traverse;

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::ir::types::*;
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::Workflow;

/// Compile a workflow snapshot into an execution plan.
pub fn build_workflow_execution(workflow: &Workflow) -> ExecutionPlan {
    let graph = WorkflowGraph::build(workflow);
    lower(workflow, &graph)
}

/// Compile against a graph that was already built for `workflow`.
pub fn lower<'a>(workflow: &'a Workflow, graph: &WorkflowGraph<'a>) -> ExecutionPlan {
    let mut warnings = Vec::new();

    // 1. Entry
    let entry = entry::resolve_entry(workflow, graph, &mut warnings);

    // 2. Reachable order
    let order = entry
        .map(|e| traverse::traverse_reachable(graph, e))
        .unwrap_or_default();

    // 3. Unreachable nodes
    let reachable: HashSet<&str> = order.iter().copied().collect();
    for node in workflow.nodes.iter().filter(|n| !reachable.contains(n.id())) {
        warnings.push(ExecutorWarning::for_node(
            WarningCode::UnreachableNode,
            node.id(),
            format!("Node '{}' is not reachable from the entry node.", node.id()),
        ));
    }

    // 4. Cycles
    for node_id in traverse::detect_cycles(graph, &order) {
        warnings.push(ExecutorWarning::for_node(
            WarningCode::CycleDetected,
            node_id,
            format!(
                "Cycle detected involving node '{node_id}'. Backend execution should guard against infinite loops."
            ),
        ));
    }

    // 5. Per-node compilation, in visit order
    let mut nodes = IndexMap::with_capacity(order.len());
    for &id in &order {
        if let Some(node) = graph.node(id) {
            nodes.insert(id.to_string(), builder::build_execution_node(node, graph, &mut warnings));
        }
    }

    debug!(
        entry = entry.unwrap_or("<none>"),
        reachable = order.len(),
        total = workflow.nodes.len(),
        warnings = warnings.len(),
        "compiled execution plan"
    );

    ExecutionPlan {
        entry: entry.map(str::to_string),
        order: order.into_iter().map(str::to_string).collect(),
        nodes,
        warnings,
    }
}
