//! Crate error type.
//!
//! Rejected connections, validation issues and compiler warnings are data,
//! not errors; this type only covers unreadable input and the publish gate.

use thiserror::Error;

use crate::validate::ValidationIssue;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to parse workflow JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("workflow has {} blocking validation issue(s)", blocking_count(.issues))]
    Invalid { issues: Vec<ValidationIssue> },
}

fn blocking_count(issues: &[ValidationIssue]) -> usize {
    issues.iter().filter(|i| i.is_error()).count()
}

impl WorkflowError {
    /// Issues that blocked the operation, if any.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            WorkflowError::Invalid { issues } => issues,
            WorkflowError::Parse(_) => &[],
        }
    }
}
