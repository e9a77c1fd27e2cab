//! petgraph-based directed graph wrapper for the editor workflow.
//!
//! Built fresh for every validation or compile call and dropped afterwards.
//! Edges whose endpoints are not known nodes still get a vertex (a
//! "phantom"), so adjacency follows them the way id-keyed lookups would.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};

use super::types::{Workflow, WorkflowEdge, WorkflowNode};

pub struct WorkflowGraph<'a> {
    /// Vertex weight is the node id; edge weight is the source edge.
    pub graph: DiGraph<&'a str, &'a WorkflowEdge>,
    pub node_indices: HashMap<&'a str, NodeIndex>,
    nodes: HashMap<&'a str, &'a WorkflowNode>,
}

impl<'a> WorkflowGraph<'a> {
    pub fn build(workflow: &'a Workflow) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut nodes = HashMap::new();

        for node in &workflow.nodes {
            let id = node.id();
            // Later nodes shadow earlier ones with the same id.
            nodes.insert(id, node);
            node_indices
                .entry(id)
                .or_insert_with(|| graph.add_node(id));
        }

        for edge in &workflow.edges {
            let source = *node_indices
                .entry(edge.source.as_str())
                .or_insert_with(|| graph.add_node(edge.source.as_str()));
            let target = *node_indices
                .entry(edge.target.as_str())
                .or_insert_with(|| graph.add_node(edge.target.as_str()));
            graph.add_edge(source, target, edge);
        }

        WorkflowGraph {
            graph,
            node_indices,
            nodes,
        }
    }

    /// The node with this id, or `None` for unknown ids and phantoms.
    pub fn node(&self, id: &str) -> Option<&'a WorkflowNode> {
        self.nodes.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Outgoing edges of `node_id` in original insertion order.
    pub fn outgoing_by_source(&self, node_id: &str) -> Vec<&'a WorkflowEdge> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), *e.weight()))
            .collect();
        // petgraph walks the adjacency list newest-first; edge indices are
        // assigned in insertion order.
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    /// Target ids of the outgoing edges, in insertion order.
    pub fn successors(&self, node_id: &str) -> Vec<&'a str> {
        self.outgoing_by_source(node_id)
            .into_iter()
            .map(|e| e.target.as_str())
            .collect()
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn has_incoming(&self, node_id: &str) -> bool {
        self.incoming_count(node_id) > 0
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    pub fn has_outgoing(&self, node_id: &str) -> bool {
        self.outgoing_count(node_id) > 0
    }

    /// Whether `to` can be reached from `from` along forward edges.
    /// A node always reaches itself.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.node_indices.get(from), self.node_indices.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Every vertex id reachable from `start`, including `start` itself.
    pub fn reachable_from(&self, start: &str) -> HashSet<&'a str> {
        let mut reachable = HashSet::new();
        let Some(&idx) = self.node_indices.get(start) else {
            return reachable;
        };
        let mut bfs = Bfs::new(&self.graph, idx);
        while let Some(nx) = bfs.next(&self.graph) {
            reachable.insert(self.graph[nx]);
        }
        reachable
    }

    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}
