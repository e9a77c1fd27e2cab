//! Per-node compilation: normalized runtime fields and successor wiring.
//! `build_execution_node` matches on every `WorkflowNode` variant and must
//! be updated when node types or configs change in `parse/types.rs`.

use crate::ir::types::*;
use crate::parse::graph::WorkflowGraph;
use crate::parse::lenient::non_blank;
use crate::parse::types::{Branch, ConditionConfig, WorkflowEdge, WorkflowNode};
use crate::rules;

use super::ordering::sort_edges_deterministically;
use super::traverse::live_outgoing;

/// Field name used when a condition has none configured.
const DEFAULT_RULE_FIELD: &str = "field";

/// Compile one reachable node. Branch anomalies are appended to `warnings`.
pub fn build_execution_node(
    node: &WorkflowNode,
    graph: &WorkflowGraph<'_>,
    warnings: &mut Vec<ExecutorWarning>,
) -> ExecutionNode {
    let outgoing = live_outgoing(graph, node.id());

    let (runtime, next) = match node {
        WorkflowNode::Condition(n) => (
            NodeRuntime::Branch(BranchRuntime {
                rule: pick_rule(&n.data.config),
            }),
            branch_next(node.id(), &outgoing, warnings),
        ),
        WorkflowNode::Delay(n) => (
            NodeRuntime::Delay(DelayRuntime {
                delay_ms: delay_ms(n.data.config.minutes),
            }),
            first_next(&outgoing, graph),
        ),
        WorkflowNode::Trigger(n) => {
            let cfg = &n.data.config;
            let schedule_at = cfg.schedule.as_ref().and_then(|s| owned(s.at.as_deref()));
            (
                NodeRuntime::Trigger(TriggerRuntime {
                    trigger_type: cfg.trigger_type.unwrap_or_default(),
                    event_name: owned(cfg.event_name.as_deref()),
                    schedule_at,
                }),
                first_next(&outgoing, graph),
            )
        }
        WorkflowNode::Audience(n) => (
            NodeRuntime::Audience(AudienceRuntime {
                audience_type: n.data.config.audience_type.unwrap_or_default(),
                list_id: owned(n.data.config.list_id.as_deref()),
            }),
            first_next(&outgoing, graph),
        ),
        WorkflowNode::Sms(_) => action(Some(Channel::Sms), node, &outgoing, graph),
        WorkflowNode::Whatsapp(_) => action(Some(Channel::Whatsapp), node, &outgoing, graph),
        WorkflowNode::Notification(_) => action(Some(Channel::Notification), node, &outgoing, graph),
        WorkflowNode::Other(_) => action(None, node, &outgoing, graph),
    };

    let config = node.raw_config();
    ExecutionNode {
        id: node.id().to_string(),
        node_type: node.type_name().to_string(),
        kind: ExecutionKind::for_node_type(node.node_type()),
        label: owned(Some(node.label())),
        config: config.is_object().then(|| config.clone()),
        runtime,
        next,
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

fn pick_rule(config: &ConditionConfig) -> ConditionRule {
    ConditionRule {
        field: owned(config.field.as_deref()).unwrap_or_else(|| DEFAULT_RULE_FIELD.to_string()),
        operator: config.operator.unwrap_or_default(),
        value: config
            .value
            .clone()
            .unwrap_or_else(|| serde_json::Value::String(String::new())),
    }
}

/// Minutes to whole milliseconds, clamped at zero. Missing or non-finite
/// input counts as zero.
fn delay_ms(minutes: Option<f64>) -> u64 {
    let minutes = minutes.filter(|m| m.is_finite()).unwrap_or(0.0);
    (minutes * 60_000.0).round().max(0.0) as u64
}

/// `single` to the first edge in deterministic order, or `end`.
fn first_next(outgoing: &[&WorkflowEdge], graph: &WorkflowGraph<'_>) -> ExecutionNext {
    match sort_edges_deterministically(outgoing, graph).first() {
        Some(edge) => ExecutionNext::Single {
            node_id: edge.target.clone(),
            edge_id: edge.id.clone(),
        },
        None => ExecutionNext::End,
    }
}

fn action(
    channel: Option<Channel>,
    node: &WorkflowNode,
    outgoing: &[&WorkflowEdge],
    graph: &WorkflowGraph<'_>,
) -> (NodeRuntime, ExecutionNext) {
    let runtime = NodeRuntime::Action(ActionRuntime {
        channel,
        priority: rules::default_priority(node.node_type()),
    });

    let sorted = sort_edges_deterministically(outgoing, graph);
    let next = match sorted.as_slice() {
        [] => ExecutionNext::End,
        [edge] => ExecutionNext::Single {
            node_id: edge.target.clone(),
            edge_id: edge.id.clone(),
        },
        many => ExecutionNext::Sequential {
            node_ids: many.iter().map(|e| e.target.clone()).collect(),
            edge_ids: many.iter().map(|e| e.id.clone()).collect(),
        },
    };
    (runtime, next)
}

/// Split condition edges by handle; the first edge on each side is used.
/// Edges are kept in insertion order, not priority order.
fn branch_next(
    node_id: &str,
    outgoing: &[&WorkflowEdge],
    warnings: &mut Vec<ExecutorWarning>,
) -> ExecutionNext {
    let side = |branch: Branch| {
        outgoing
            .iter()
            .copied()
            .filter(|e| e.source_handle() == Some(branch.handle()))
            .collect::<Vec<_>>()
    };
    let if_edges = side(Branch::If);
    let else_edges = side(Branch::Else);

    if if_edges.is_empty() || else_edges.is_empty() {
        warnings.push(ExecutorWarning::for_node(
            WarningCode::MissingConditionBranch,
            node_id,
            "Condition node should have both IF and ELSE branches.",
        ));
    }
    if if_edges.len() > 1 || else_edges.len() > 1 {
        warnings.push(ExecutorWarning::for_node(
            WarningCode::MultipleConditionBranch,
            node_id,
            "Condition node has multiple edges for IF/ELSE; using the first of each.",
        ));
    }

    let target = |edges: &[&WorkflowEdge]| {
        edges.first().map(|e| BranchTarget {
            node_id: e.target.clone(),
            edge_id: e.id.clone(),
        })
    };
    ExecutionNext::Branch {
        if_branch: target(&if_edges),
        else_branch: target(&else_edges),
    }
}
