//! Execution plan invariant validation.
//!
//! Checks that an `ExecutionPlan` is internally consistent before a runner
//! follows it. Plans from `build_workflow_execution` always pass; this is for
//! plans loaded back from storage.

use std::collections::HashSet;

use crate::ir::types::*;
use crate::parse::types::NodeType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanViolation {
    pub code: &'static str,
    pub message: String,
    /// The node the violation was found at, if applicable.
    pub node_id: Option<String>,
}

impl std::fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} (at node '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Validate a plan against all invariants. Returns all violations found.
pub fn validate_plan(plan: &ExecutionPlan) -> Vec<PlanViolation> {
    let mut violations = Vec::new();

    validate_entry_presence(plan, &mut violations);
    validate_unique_order(plan, &mut violations);
    validate_order_matches_nodes(plan, &mut violations);
    validate_entry_leads_order(plan, &mut violations);
    validate_next_targets(plan, &mut violations);
    validate_kinds(plan, &mut violations);

    violations
}

// ---------------------------------------------------------------------------
// Invariant: no entry means an empty plan
// ---------------------------------------------------------------------------

fn validate_entry_presence(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    if plan.entry.is_none() && (!plan.order.is_empty() || !plan.nodes.is_empty()) {
        violations.push(PlanViolation {
            code: "E001",
            message: "Plan has nodes but no entry".into(),
            node_id: None,
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: each node is visited once
// ---------------------------------------------------------------------------

fn validate_unique_order(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    let mut seen = HashSet::new();
    for id in &plan.order {
        if !seen.insert(id.as_str()) {
            violations.push(PlanViolation {
                code: "E002",
                message: format!("Node '{id}' appears more than once in the order"),
                node_id: Some(id.clone()),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: `order` and `nodes` cover the same ids
// ---------------------------------------------------------------------------

fn validate_order_matches_nodes(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    let ordered: HashSet<&str> = plan.order.iter().map(String::as_str).collect();

    for id in &plan.order {
        if !plan.nodes.contains_key(id) {
            violations.push(PlanViolation {
                code: "E003",
                message: format!("Ordered node '{id}' has no compiled node"),
                node_id: Some(id.clone()),
            });
        }
    }
    for id in plan.nodes.keys() {
        if !ordered.contains(id.as_str()) {
            violations.push(PlanViolation {
                code: "E003",
                message: format!("Compiled node '{id}' is missing from the order"),
                node_id: Some(id.clone()),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: traversal starts at the entry
// ---------------------------------------------------------------------------

fn validate_entry_leads_order(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    let Some(entry) = &plan.entry else {
        return;
    };
    if plan.order.first() != Some(entry) {
        violations.push(PlanViolation {
            code: "E004",
            message: format!("Entry '{entry}' is not the first node in the order"),
            node_id: Some(entry.clone()),
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: every successor is a compiled node
// ---------------------------------------------------------------------------

fn validate_next_targets(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    for (id, node) in &plan.nodes {
        if let ExecutionNext::Sequential { node_ids, edge_ids } = &node.next {
            if node_ids.len() != edge_ids.len() {
                violations.push(PlanViolation {
                    code: "E005",
                    message: format!(
                        "Sequential successors list {} nodes but {} edges",
                        node_ids.len(),
                        edge_ids.len()
                    ),
                    node_id: Some(id.clone()),
                });
            }
        }
        for target in node.next.targets() {
            if !plan.nodes.contains_key(target) {
                violations.push(PlanViolation {
                    code: "E005",
                    message: format!("Successor '{target}' is not a compiled node"),
                    node_id: Some(id.clone()),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: kind and runtime agree with the node type
// ---------------------------------------------------------------------------

fn validate_kinds(plan: &ExecutionPlan, violations: &mut Vec<PlanViolation>) {
    for (id, node) in &plan.nodes {
        let expected = ExecutionKind::for_node_type(NodeType::from_name(&node.node_type));
        if node.kind != expected {
            violations.push(PlanViolation {
                code: "E006",
                message: format!(
                    "Node of type '{}' has kind {:?}, expected {:?}",
                    node.node_type, node.kind, expected
                ),
                node_id: Some(id.clone()),
            });
            continue;
        }

        let runtime_matches = matches!(
            (expected, &node.runtime),
            (ExecutionKind::Trigger, NodeRuntime::Trigger(_))
                | (ExecutionKind::Audience, NodeRuntime::Audience(_))
                | (ExecutionKind::Branch, NodeRuntime::Branch(_))
                | (ExecutionKind::Delay, NodeRuntime::Delay(_))
                | (ExecutionKind::Action, NodeRuntime::Action(_))
        );
        let next_matches = match expected {
            ExecutionKind::Branch => matches!(node.next, ExecutionNext::Branch { .. }),
            _ => !matches!(node.next, ExecutionNext::Branch { .. }),
        };
        if !runtime_matches || !next_matches {
            violations.push(PlanViolation {
                code: "E006",
                message: format!("Runtime or successors of '{id}' do not fit kind {expected:?}"),
                node_id: Some(id.clone()),
            });
        }
    }
}
