//! Per-node configuration validation.
//! Match arms here must track `WorkflowNode` in `parse/types.rs`.

use super::issue::ValidationIssue;
use crate::parse::lenient::non_blank;
use crate::parse::types::*;

/// Validate a single node's config. Returns all issues found.
pub fn validate_node_config(node: &WorkflowNode) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let id = node.id();

    match node {
        WorkflowNode::Audience(n) => {
            let cfg = &n.data.config;
            let audience_type = cfg.audience_type.unwrap_or_default();
            if audience_type == AudienceType::List && non_blank(cfg.list_id.as_deref()).is_none() {
                issues.push(ValidationIssue::node(id, "validation.audienceListIdRequired"));
            }
        }
        WorkflowNode::Sms(n) => {
            if non_blank(n.data.config.text.as_deref()).is_none() {
                issues.push(ValidationIssue::node(id, "validation.smsMessageRequired"));
            }
        }
        WorkflowNode::Whatsapp(n) => {
            if non_blank(n.data.config.template_id.as_deref()).is_none() {
                issues.push(ValidationIssue::node(id, "validation.whatsappTemplateRequired"));
            }
        }
        WorkflowNode::Delay(n) => {
            let valid = n
                .data
                .config
                .minutes
                .is_some_and(|m| m.is_finite() && m >= 0.0);
            if !valid {
                issues.push(ValidationIssue::node(id, "validation.delayMinutesInvalid"));
            }
        }
        WorkflowNode::Notification(n) => {
            let cfg = &n.data.config;
            if non_blank(cfg.title.as_deref()).is_none() && non_blank(cfg.body.as_deref()).is_none() {
                issues.push(ValidationIssue::node(id, "validation.notificationContentRequired"));
            }
        }
        WorkflowNode::Trigger(_) | WorkflowNode::Condition(_) | WorkflowNode::Other(_) => {}
    }

    issues
}
