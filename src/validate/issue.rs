//! Validation issue types produced by the whole-graph validator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What an issue points at, for highlighting in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueTarget {
    Workflow,
    Node,
    Edge,
}

/// One finding. `message_key` is an i18n key; the core never formats text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub severity: Severity,
    pub target: IssueTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_params: Option<Map<String, Value>>,
}

impl ValidationIssue {
    pub fn workflow(message_key: &str) -> Self {
        Self {
            severity: Severity::Error,
            target: IssueTarget::Workflow,
            id: None,
            message_key: message_key.to_string(),
            message_params: None,
        }
    }

    pub fn node(id: &str, message_key: &str) -> Self {
        Self {
            severity: Severity::Error,
            target: IssueTarget::Node,
            id: Some(id.to_string()),
            message_key: message_key.to_string(),
            message_params: None,
        }
    }

    pub fn edge(id: &str, message_key: &str) -> Self {
        Self {
            severity: Severity::Error,
            target: IssueTarget::Edge,
            id: Some(id.to_string()),
            message_key: message_key.to_string(),
            message_params: None,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.message_params
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Result of a whole-graph validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowValidation {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl WorkflowValidation {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let valid = issues.iter().all(|i| !i.is_error());
        Self { valid, issues }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Issues attached to a given node or edge id.
    pub fn issues_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues
            .iter()
            .filter(move |i| i.id.as_deref() == Some(id))
    }
}
