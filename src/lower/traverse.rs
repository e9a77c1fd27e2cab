//! Reachability walk and cycle detection for the compiler.
//!
//! Both only follow edges whose target is a known node, so the visit order
//! never contains an id the plan has no node for.

use std::collections::HashSet;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::WorkflowEdge;

/// Outgoing edges of `node_id` that land on a known node, in insertion order.
pub fn live_outgoing<'a>(graph: &WorkflowGraph<'a>, node_id: &str) -> Vec<&'a WorkflowEdge> {
    graph
        .outgoing_by_source(node_id)
        .into_iter()
        .filter(|e| graph.contains_node(&e.target))
        .collect()
}

/// Iterative DFS from `entry`. The first outgoing edge is explored first and
/// each node appears once, so cycles terminate.
pub fn traverse_reachable<'a>(graph: &WorkflowGraph<'a>, entry: &'a str) -> Vec<&'a str> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![entry];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        stack.extend(live_outgoing(graph, id).into_iter().rev().map(|e| e.target.as_str()));
    }

    order
}

struct CycleSearch<'g, 'a> {
    graph: &'g WorkflowGraph<'a>,
    visited: HashSet<&'a str>,
    on_stack: HashSet<&'a str>,
    found: HashSet<&'a str>,
    in_cycle: Vec<&'a str>,
}

impl<'a> CycleSearch<'_, 'a> {
    fn visit(&mut self, id: &'a str) {
        if self.on_stack.contains(id) {
            if self.found.insert(id) {
                self.in_cycle.push(id);
            }
            return;
        }
        if !self.visited.insert(id) {
            return;
        }
        self.on_stack.insert(id);
        for edge in live_outgoing(self.graph, id) {
            self.visit(edge.target.as_str());
        }
        self.on_stack.remove(id);
    }
}

/// Nodes re-entered while still on the DFS stack, in first-detection order.
/// Each DFS root is taken from `order`.
pub fn detect_cycles<'a>(graph: &WorkflowGraph<'a>, order: &[&'a str]) -> Vec<&'a str> {
    let mut search = CycleSearch {
        graph,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        found: HashSet::new(),
        in_cycle: Vec::new(),
    };
    for &id in order {
        search.visit(id);
    }
    search.in_cycle
}
