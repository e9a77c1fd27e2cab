//! Static rule tables shared by both validators and the compiler.

use crate::parse::types::{Branch, HANDLE_IN, HANDLE_OUT, NodeType};

/// Node types a node of type `source` may connect to.
pub fn allowed_targets(source: NodeType) -> &'static [NodeType] {
    use NodeType::*;
    match source {
        Trigger => &[Audience, Condition, Delay, Sms, Whatsapp, Notification],
        Audience => &[Condition, Delay, Sms, Whatsapp, Notification],
        Condition => &[Delay, Sms, Whatsapp, Notification, Condition],
        Delay => &[Condition, Delay, Sms, Whatsapp, Notification],
        Sms => &[Delay, Condition, Sms, Whatsapp, Notification],
        Whatsapp => &[Delay, Condition, Sms, Whatsapp, Notification],
        Notification => &[Delay, Condition, Sms, Whatsapp, Notification],
        Other => &[],
    }
}

pub fn is_transition_allowed(source: NodeType, target: NodeType) -> bool {
    allowed_targets(source).contains(&target)
}

/// A target handle is acceptable when unset or `"in"`.
pub fn is_valid_target_handle(handle: Option<&str>) -> bool {
    matches!(handle, None | Some(HANDLE_IN))
}

/// How a source handle fails the port rule for its node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHandleFault {
    /// Condition source not on `if`/`else`.
    NotABranch,
    /// Ordinary source on something other than `out`.
    NotOut,
}

/// Check a source handle against the ports of a `source` node.
pub fn check_source_handle(source: NodeType, handle: Option<&str>) -> Result<(), SourceHandleFault> {
    match source {
        NodeType::Condition => Branch::from_handle(handle)
            .map(|_| ())
            .ok_or(SourceHandleFault::NotABranch),
        _ => match handle {
            None | Some(HANDLE_OUT) => Ok(()),
            Some(_) => Err(SourceHandleFault::NotOut),
        },
    }
}

/// Priority used for edges whose target type is unknown.
pub const FALLBACK_PRIORITY: u32 = 999;

/// Default ordering priority for an edge into a node of this type.
/// Lower runs first.
pub fn default_priority(target: NodeType) -> u32 {
    match target {
        NodeType::Whatsapp => 10,
        NodeType::Sms => 20,
        NodeType::Notification => 30,
        NodeType::Delay => 40,
        NodeType::Condition | NodeType::Audience | NodeType::Trigger => 0,
        NodeType::Other => FALLBACK_PRIORITY,
    }
}
