//! Graph-level structural validation rules.

use std::collections::HashMap;

use super::issue::ValidationIssue;
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{Branch, Workflow, WorkflowNode};
use crate::rules::{self, SourceHandleFault};

/// Run all structural validation rules. Returns all issues found.
pub fn validate_structural(workflow: &Workflow, graph: &WorkflowGraph<'_>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    exactly_one_trigger(workflow, &mut issues);
    edge_integrity(workflow, &mut issues);
    trigger_has_no_incoming(workflow, graph, &mut issues);
    condition_branches_connected(workflow, graph, &mut issues);
    no_cycles(graph, &mut issues);
    all_reachable_from_trigger(workflow, graph, &mut issues);

    issues
}

fn exactly_one_trigger(workflow: &Workflow, issues: &mut Vec<ValidationIssue>) {
    let triggers: Vec<&WorkflowNode> = workflow.triggers().collect();
    if triggers.is_empty() {
        issues.push(ValidationIssue::workflow("validation.workflowMustHaveTrigger"));
    } else if triggers.len() > 1 {
        for trigger in triggers {
            issues.push(ValidationIssue::node(trigger.id(), "validation.onlyOneTrigger"));
        }
    }
}

/// Per-edge checks for imported or hand-edited data. An edge with a missing
/// endpoint is reported once and skipped.
fn edge_integrity(workflow: &Workflow, issues: &mut Vec<ValidationIssue>) {
    let nodes_by_id: HashMap<&str, &WorkflowNode> = workflow
        .nodes
        .iter()
        .map(|n| (n.id(), n))
        .collect();

    for edge in &workflow.edges {
        let Some(source) = nodes_by_id.get(edge.source.as_str()) else {
            issues.push(
                ValidationIssue::edge(&edge.id, "validation.edgeSourceNotFound")
                    .with_param("source", edge.source.as_str()),
            );
            continue;
        };
        let Some(target) = nodes_by_id.get(edge.target.as_str()) else {
            issues.push(
                ValidationIssue::edge(&edge.id, "validation.edgeTargetNotFound")
                    .with_param("target", edge.target.as_str()),
            );
            continue;
        };

        if !rules::is_valid_target_handle(edge.target_handle()) {
            issues.push(ValidationIssue::edge(&edge.id, "validation.edgeMustConnectToIn"));
        }

        match rules::check_source_handle(source.node_type(), edge.source_handle()) {
            Ok(()) => {}
            Err(SourceHandleFault::NotABranch) => {
                issues.push(ValidationIssue::edge(&edge.id, "validation.conditionMustUseIfElse"));
            }
            Err(SourceHandleFault::NotOut) => {
                issues.push(ValidationIssue::edge(&edge.id, "validation.edgeMustConnectFromOut"));
            }
        }

        if target.is_trigger() {
            issues.push(ValidationIssue::edge(&edge.id, "validation.triggerNoIncoming"));
        }

        if !rules::is_transition_allowed(source.node_type(), target.node_type()) {
            issues.push(
                ValidationIssue::edge(&edge.id, "validation.invalidConnectionType")
                    .with_param("sourceType", source.type_name())
                    .with_param("targetType", target.type_name()),
            );
        }
    }
}

/// Reported in addition to the edge-level `triggerNoIncoming` issue; one bad
/// edge into a trigger yields one issue of each.
fn trigger_has_no_incoming(
    workflow: &Workflow,
    graph: &WorkflowGraph<'_>,
    issues: &mut Vec<ValidationIssue>,
) {
    for trigger in workflow.triggers() {
        if graph.has_incoming(trigger.id()) {
            issues.push(ValidationIssue::node(trigger.id(), "validation.triggerNoIncomingEdges"));
        }
    }
}

fn condition_branches_connected(
    workflow: &Workflow,
    graph: &WorkflowGraph<'_>,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in workflow.nodes.iter().filter(|n| n.is_condition()) {
        let outgoing = graph.outgoing_by_source(node.id());
        let connected =
            |branch: Branch| outgoing.iter().any(|e| e.source_handle() == Some(branch.handle()));

        if !connected(Branch::If) {
            issues.push(ValidationIssue::node(node.id(), "validation.conditionIfNotConnected"));
        }
        if !connected(Branch::Else) {
            issues.push(ValidationIssue::node(node.id(), "validation.conditionElseNotConnected"));
        }
    }
}

fn no_cycles(graph: &WorkflowGraph<'_>, issues: &mut Vec<ValidationIssue>) {
    if graph.is_cyclic() {
        issues.push(ValidationIssue::workflow("validation.workflowContainsCycle"));
    }
}

/// Only meaningful with a single trigger; trigger-count problems are
/// reported by `exactly_one_trigger`.
fn all_reachable_from_trigger(
    workflow: &Workflow,
    graph: &WorkflowGraph<'_>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut triggers = workflow.triggers();
    let (Some(trigger), None) = (triggers.next(), triggers.next()) else {
        return;
    };

    let reachable = graph.reachable_from(trigger.id());
    for node in &workflow.nodes {
        if !reachable.contains(node.id()) {
            issues.push(ValidationIssue::node(node.id(), "validation.nodeNotReachable"));
        }
    }
}
