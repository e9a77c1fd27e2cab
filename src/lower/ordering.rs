//! Deterministic successor ordering.

use std::cmp::Ordering;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::WorkflowEdge;
use crate::rules::{self, FALLBACK_PRIORITY};

/// Effective priority of an edge: its explicit `data.priority` if finite,
/// otherwise the default for its target's node type.
pub fn edge_priority(edge: &WorkflowEdge, graph: &WorkflowGraph<'_>) -> f64 {
    edge.priority().unwrap_or_else(|| {
        let default = graph
            .node(&edge.target)
            .map(|n| rules::default_priority(n.node_type()))
            .unwrap_or(FALLBACK_PRIORITY);
        f64::from(default)
    })
}

/// Sort by ascending priority, ties broken by edge id.
pub fn sort_edges_deterministically<'a>(
    edges: &[&'a WorkflowEdge],
    graph: &WorkflowGraph<'_>,
) -> Vec<&'a WorkflowEdge> {
    let mut keyed: Vec<(f64, &'a WorkflowEdge)> = edges
        .iter()
        .map(|e| (edge_priority(e, graph), *e))
        .collect();
    keyed.sort_by(|(pa, a), (pb, b)| match pa.total_cmp(pb) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    keyed.into_iter().map(|(_, e)| e).collect()
}
