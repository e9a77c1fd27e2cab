//! Storable workflow documents.
//!
//! A document wraps one graph snapshot with its metadata and, once compiled,
//! the execution plan. Storage itself belongs to the host; this module only
//! produces and reads the JSON it keeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::ir::types::ExecutionPlan;
use crate::lower::build_workflow_execution;
use crate::parse::types::*;
use crate::validate::validate_workflow;

pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled workflow";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionPlan>,
    #[serde(flatten)]
    pub workflow: Workflow,
}

/// List entry for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

impl WorkflowDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: WorkflowStatus,
        version: u32,
        workflow: Workflow,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            version,
            updated_at: Utc::now(),
            execution: None,
            workflow,
        }
    }

    /// A fresh draft holding the starter graph `trigger-1 → audience-1`,
    /// already compiled.
    pub fn seed(name: Option<&str>) -> Self {
        let workflow = Workflow::new(
            vec![
                WorkflowNode::Trigger(NodeBase::new(
                    "trigger-1",
                    Position::new(120.0, 80.0),
                    NodeType::Trigger.default_label(),
                    TriggerConfig::default(),
                )),
                WorkflowNode::Audience(NodeBase::new(
                    "audience-1",
                    Position::new(120.0, 220.0),
                    NodeType::Audience.default_label(),
                    AudienceConfig::default(),
                )),
            ],
            vec![WorkflowEdge::new("e1-2", "trigger-1", "audience-1")],
        );

        let mut doc = Self::new(
            new_document_id(),
            name.unwrap_or(DEFAULT_WORKFLOW_NAME),
            WorkflowStatus::Draft,
            1,
            workflow,
        );
        doc.compile();
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, WorkflowError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Recompile the embedded plan from the current graph.
    pub fn compile(&mut self) -> &ExecutionPlan {
        self.execution.insert(build_workflow_execution(&self.workflow))
    }

    /// Save/run gate: refuse graphs with blocking issues, otherwise compile
    /// and mark published. A refused document is left untouched.
    pub fn publish(&mut self) -> Result<&ExecutionPlan, WorkflowError> {
        let validation = validate_workflow(&self.workflow);
        if !validation.valid {
            debug!(id = %self.id, issues = validation.issues.len(), "publish refused");
            return Err(WorkflowError::Invalid {
                issues: validation.issues,
            });
        }

        self.status = WorkflowStatus::Published;
        self.touch();
        debug!(id = %self.id, version = self.version, "published workflow");
        Ok(self.compile())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_status(&mut self, status: WorkflowStatus) {
        self.status = status;
        self.touch();
    }

    /// A new draft named `"<name> (copy)"` with the same graph. Every node
    /// and edge id gets a `-<new id>` suffix.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::seed(Some(&format!("{} (copy)", self.name)));
        let suffix = |id: &str| format!("{id}-{}", copy.id);

        let nodes = self
            .workflow
            .nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                node.set_id(suffix(node.id()));
                node
            })
            .collect();
        let edges = self
            .workflow
            .edges
            .iter()
            .map(|edge| WorkflowEdge {
                id: suffix(&edge.id),
                source: suffix(&edge.source),
                target: suffix(&edge.target),
                ..edge.clone()
            })
            .collect();

        copy.workflow = Workflow::new(nodes, edges);
        copy.compile();
        copy
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            updated_at: self.updated_at,
            version: self.version,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Order summaries most recently updated first.
pub fn sort_newest_first(summaries: &mut [WorkflowSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// `wf-` followed by the first eight hex digits of a v4 uuid.
fn new_document_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("wf-{}", &uuid[..8])
}
