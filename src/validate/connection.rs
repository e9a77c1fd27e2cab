//! Connection rules checked while the user drags a new edge.
//!
//! The candidate is not part of the graph yet. Rules run in a fixed order and
//! the first failure wins, so the editor always shows the most basic problem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::parse::graph::WorkflowGraph;
use crate::parse::types::{Branch, NodeType, Workflow};
use crate::rules::{self, SourceHandleFault};

/// A proposed edge, as reported by the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn from_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn to_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    fn source_handle(&self) -> Option<&str> {
        self.source_handle.as_deref().filter(|h| !h.is_empty())
    }

    fn target_handle(&self) -> Option<&str> {
        self.target_handle.as_deref().filter(|h| !h.is_empty())
    }
}

/// Why a connection was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejection {
    #[error("connection needs both a source and a target")]
    Incomplete,

    #[error("a node cannot connect to itself")]
    SelfLoop,

    #[error("node '{node_id}' does not exist")]
    UnknownNode { node_id: String },

    #[error("connections must end on the 'in' handle")]
    TargetHandle,

    #[error("condition nodes connect from their 'if' or 'else' outputs")]
    ConditionHandle,

    #[error("connections must start from the 'out' handle")]
    SourceHandle,

    #[error("the trigger must be the first step")]
    TriggerTarget,

    #[error("{source_type} cannot be followed by {target_type}")]
    InvalidTransition {
        source_type: String,
        target_type: String,
    },

    #[error("connection would create a cycle")]
    CreatesCycle,

    #[error("the {} branch is already connected", .branch.display_name())]
    BranchAlreadyConnected { branch: Branch },

    #[error("'if' and 'else' cannot lead to the same step")]
    BranchesShareTarget,
}

impl ConnectionRejection {
    /// i18n key shown to the user.
    pub fn message_key(&self) -> &'static str {
        match self {
            ConnectionRejection::Incomplete => "validation.connectionIncomplete",
            ConnectionRejection::SelfLoop => "validation.cannotConnectToSelf",
            ConnectionRejection::UnknownNode { .. } => "validation.connectionNodeNotFound",
            ConnectionRejection::TargetHandle => "validation.connectToInputHandle",
            ConnectionRejection::ConditionHandle => "validation.useIfElseOutputs",
            ConnectionRejection::SourceHandle => "validation.connectFromOutputHandle",
            ConnectionRejection::TriggerTarget => "validation.triggerMustBeFirst",
            ConnectionRejection::InvalidTransition { .. } => "validation.invalidStepConnection",
            ConnectionRejection::CreatesCycle => "validation.connectionCreatesCycle",
            ConnectionRejection::BranchAlreadyConnected { .. } => "validation.branchAlreadyConnected",
            ConnectionRejection::BranchesShareTarget => "validation.ifElseSameTarget",
        }
    }

    /// Interpolation params for the message, if the key takes any.
    pub fn message_params(&self) -> Option<Map<String, Value>> {
        let mut params = Map::new();
        match self {
            ConnectionRejection::UnknownNode { node_id } => {
                params.insert("nodeId".into(), node_id.as_str().into());
            }
            ConnectionRejection::InvalidTransition {
                source_type,
                target_type,
            } => {
                params.insert("sourceType".into(), source_type.as_str().into());
                params.insert("targetType".into(), target_type.as_str().into());
            }
            ConnectionRejection::BranchAlreadyConnected { branch } => {
                params.insert("branch".into(), branch.display_name().into());
            }
            _ => return None,
        }
        Some(params)
    }
}

/// Wire shape of a connection check: `{valid, reasonKey?, reasonParams?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionVerdict {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_params: Option<Map<String, Value>>,
}

impl From<Result<(), ConnectionRejection>> for ConnectionVerdict {
    fn from(result: Result<(), ConnectionRejection>) -> Self {
        match result {
            Ok(()) => ConnectionVerdict {
                valid: true,
                reason_key: None,
                reason_params: None,
            },
            Err(rejection) => ConnectionVerdict {
                valid: false,
                reason_key: Some(rejection.message_key().to_string()),
                reason_params: rejection.message_params(),
            },
        }
    }
}

/// Check whether `candidate` may be added to `workflow`.
pub fn validate_connection(candidate: &Connection, workflow: &Workflow) -> Result<(), ConnectionRejection> {
    let result = check(candidate, workflow);
    if let Err(rejection) = &result {
        trace!(
            source = ?candidate.source,
            target = ?candidate.target,
            reason = rejection.message_key(),
            "connection rejected"
        );
    }
    result
}

fn check(candidate: &Connection, workflow: &Workflow) -> Result<(), ConnectionRejection> {
    let (Some(source), Some(target)) = (
        candidate.source.as_deref().filter(|s| !s.is_empty()),
        candidate.target.as_deref().filter(|t| !t.is_empty()),
    ) else {
        return Err(ConnectionRejection::Incomplete);
    };
    if source == target {
        return Err(ConnectionRejection::SelfLoop);
    }

    // Endpoints resolve to the first node with a matching id.
    let source_node = workflow.node(source).ok_or_else(|| ConnectionRejection::UnknownNode {
        node_id: source.to_string(),
    })?;
    let target_node = workflow.node(target).ok_or_else(|| ConnectionRejection::UnknownNode {
        node_id: target.to_string(),
    })?;

    if !rules::is_valid_target_handle(candidate.target_handle()) {
        return Err(ConnectionRejection::TargetHandle);
    }

    rules::check_source_handle(source_node.node_type(), candidate.source_handle()).map_err(
        |fault| match fault {
            SourceHandleFault::NotABranch => ConnectionRejection::ConditionHandle,
            SourceHandleFault::NotOut => ConnectionRejection::SourceHandle,
        },
    )?;

    if target_node.is_trigger() {
        return Err(ConnectionRejection::TriggerTarget);
    }

    if !rules::is_transition_allowed(source_node.node_type(), target_node.node_type()) {
        return Err(ConnectionRejection::InvalidTransition {
            source_type: source_node.type_name().to_string(),
            target_type: target_node.type_name().to_string(),
        });
    }

    let graph = WorkflowGraph::build(workflow);
    if graph.has_path(target, source) {
        return Err(ConnectionRejection::CreatesCycle);
    }

    // The handle rule above guarantees a branch for condition sources.
    let branch = match source_node.node_type() {
        NodeType::Condition => Branch::from_handle(candidate.source_handle()),
        _ => None,
    };
    if let Some(branch) = branch {
        let outgoing = graph.outgoing_by_source(source);
        if outgoing
            .iter()
            .any(|e| e.source_handle() == Some(branch.handle()))
        {
            return Err(ConnectionRejection::BranchAlreadyConnected { branch });
        }
        if outgoing.iter().any(|e| e.target == target) {
            return Err(ConnectionRejection::BranchesShareTarget);
        }
    }

    Ok(())
}
