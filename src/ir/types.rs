//! Execution plan types.
//!
//! The plan bridges the editor graph (input) and a backend runner (consumer).
//! It is plain serde data, with no references back into the graph, so it can
//! be embedded in a stored workflow document next to the raw nodes and edges.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::types::{AudienceType, ConditionOperator, NodeType, TriggerType};

// =============================================================================
// TOP-LEVEL PLAN
// =============================================================================

/// Complete execution plan for one workflow graph.
/// Produced by the lowering pass, recomputed in full on every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Node the runner starts at; `None` when no entry could be resolved.
    pub entry: Option<String>,
    /// DFS visitation order of the nodes reachable from `entry`.
    pub order: Vec<String>,
    /// Compiled nodes keyed by id, in `order`.
    pub nodes: IndexMap<String, ExecutionNode>,
    pub warnings: Vec<ExecutorWarning>,
}

impl ExecutionPlan {
    pub fn node(&self, id: &str) -> Option<&ExecutionNode> {
        self.nodes.get(id)
    }

    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Trigger,
    Audience,
    Branch,
    Delay,
    Action,
}

impl ExecutionKind {
    pub fn for_node_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Trigger => ExecutionKind::Trigger,
            NodeType::Audience => ExecutionKind::Audience,
            NodeType::Condition => ExecutionKind::Branch,
            NodeType::Delay => ExecutionKind::Delay,
            NodeType::Sms | NodeType::Whatsapp | NodeType::Notification | NodeType::Other => {
                ExecutionKind::Action
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionNode {
    pub id: String,
    /// The node's `type` string as written in the graph.
    #[serde(rename = "type")]
    pub node_type: String,
    pub kind: ExecutionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The node's raw config object, as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub runtime: NodeRuntime,
    pub next: ExecutionNext,
}

// =============================================================================
// RUNTIME PARAMETERS
// =============================================================================

/// Kind-specific runtime fields. Every variant has one required field no
/// other variant has, which is what untagged deserialization keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRuntime {
    Branch(BranchRuntime),
    Delay(DelayRuntime),
    Action(ActionRuntime),
    Audience(AudienceRuntime),
    Trigger(TriggerRuntime),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRuntime {
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceRuntime {
    pub audience_type: AudienceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRuntime {
    pub rule: ConditionRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRuntime {
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Whatsapp,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRuntime {
    /// `None` for node types without a known channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Default ordering priority of this action type, so a runner can
    /// reproduce the plan's successor ordering.
    pub priority: u32,
}

// =============================================================================
// SUCCESSORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchTarget {
    pub node_id: String,
    pub edge_id: String,
}

/// What runs after a node.
///
/// `Sequential` lists several successors in priority order. Whether they run
/// one after another or concurrently is left to the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ExecutionNext {
    End,
    #[serde(rename_all = "camelCase")]
    Single { node_id: String, edge_id: String },
    #[serde(rename_all = "camelCase")]
    Sequential {
        node_ids: Vec<String>,
        edge_ids: Vec<String>,
    },
    Branch {
        #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
        if_branch: Option<BranchTarget>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        else_branch: Option<BranchTarget>,
    },
}

impl ExecutionNext {
    /// Successor node ids, in plan order.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            ExecutionNext::End => vec![],
            ExecutionNext::Single { node_id, .. } => vec![node_id.as_str()],
            ExecutionNext::Sequential { node_ids, .. } => node_ids.iter().map(String::as_str).collect(),
            ExecutionNext::Branch {
                if_branch,
                else_branch,
            } => if_branch
                .iter()
                .chain(else_branch.iter())
                .map(|b| b.node_id.as_str())
                .collect(),
        }
    }
}

// =============================================================================
// WARNINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    NoEntry,
    MultipleTriggers,
    UnreachableNode,
    CycleDetected,
    MissingConditionBranch,
    MultipleConditionBranch,
}

/// Non-fatal anomaly the compiler tolerated. `message` is a developer
/// diagnostic, not a localized string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

impl ExecutorWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
            edge_id: None,
        }
    }

    pub fn for_node(code: WarningCode, node_id: &str, message: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.to_string()),
            ..Self::new(code, message)
        }
    }
}
