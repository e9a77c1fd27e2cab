//! Rust types for the editor's workflow graph JSON.
//!
//! These types are the serde target for the canvas state: nodes carry a
//! `type` tag and a per-type config record, edges carry logical port handles.
//! The config record is a lenient view; the raw config object is kept as-is
//! and is what gets written back out. Node types the engine does not know
//! parse as `WorkflowNode::Other`.
//! When a node type or config field changes, also review `rules`,
//! `validate::node_rules` and `lower::builder`, which all match on it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::lenient;

// =============================================================================
// GRAPH SNAPSHOT
// =============================================================================

/// One snapshot of the editor graph. The engine only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl Workflow {
    pub fn new(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Self {
        Self { nodes, edges }
    }

    /// First node with the given id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn count_nodes_of_type(&self, node_type: NodeType) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type() == node_type)
            .count()
    }

    pub fn triggers(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(|n| n.is_trigger())
    }
}

// =============================================================================
// EDGES & HANDLES
// =============================================================================

pub const HANDLE_IN: &str = "in";
pub const HANDLE_OUT: &str = "out";
pub const HANDLE_IF: &str = "if";
pub const HANDLE_ELSE: &str = "else";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<EdgeData>,
}

impl WorkflowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            data: None,
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.data = Some(EdgeData {
            priority: Some(priority),
        });
        self
    }

    /// Source handle, with `""` treated as unset.
    pub fn source_handle(&self) -> Option<&str> {
        self.source_handle.as_deref().filter(|h| !h.is_empty())
    }

    /// Target handle, with `""` treated as unset.
    pub fn target_handle(&self) -> Option<&str> {
        self.target_handle.as_deref().filter(|h| !h.is_empty())
    }

    /// Explicit ordering priority, if a finite one is set.
    pub fn priority(&self) -> Option<f64> {
        self.data
            .as_ref()
            .and_then(|d| d.priority)
            .filter(|p| p.is_finite())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<f64>,
}

/// One of the two output ports of a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    If,
    Else,
}

impl Branch {
    pub fn from_handle(handle: Option<&str>) -> Option<Self> {
        match handle {
            Some(HANDLE_IF) => Some(Branch::If),
            Some(HANDLE_ELSE) => Some(Branch::Else),
            _ => None,
        }
    }

    pub fn handle(self) -> &'static str {
        match self {
            Branch::If => HANDLE_IF,
            Branch::Else => HANDLE_ELSE,
        }
    }

    /// Upper-case name used in user-facing message params.
    pub fn display_name(self) -> &'static str {
        match self {
            Branch::If => "IF",
            Branch::Else => "ELSE",
        }
    }
}

// =============================================================================
// NODE TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Trigger,
    Audience,
    Condition,
    Sms,
    Whatsapp,
    Notification,
    Delay,
    /// Any type string not listed above.
    #[serde(other)]
    Other,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Trigger,
        NodeType::Audience,
        NodeType::Condition,
        NodeType::Sms,
        NodeType::Whatsapp,
        NodeType::Notification,
        NodeType::Delay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Trigger => "trigger",
            NodeType::Audience => "audience",
            NodeType::Condition => "condition",
            NodeType::Sms => "sms",
            NodeType::Whatsapp => "whatsapp",
            NodeType::Notification => "notification",
            NodeType::Delay => "delay",
            NodeType::Other => "other",
        }
    }

    /// Type for a raw `type` string; unrecognized names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(NodeType::Other)
    }

    /// Label given to freshly added nodes.
    pub fn default_label(self) -> &'static str {
        match self {
            NodeType::Trigger => "Trigger",
            NodeType::Audience => "Audience",
            NodeType::Condition => "IF / ELSE",
            NodeType::Sms => "Send SMS",
            NodeType::Whatsapp => "Send WhatsApp",
            NodeType::Notification => "Send Notification",
            NodeType::Delay => "Delay",
            NodeType::Other => "",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type '{0}'")]
pub struct UnknownNodeType(pub String);

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// NODE BASE
// =============================================================================

/// A node's `data` block. `config` is derived from `raw_config` and never
/// written back; serialization emits `raw_config` untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData<C> {
    pub label: String,
    pub config: C,
    raw_config: Value,
}

impl<C> NodeData<C> {
    pub fn new(label: impl Into<String>, config: C) -> Self
    where
        C: Serialize,
    {
        let raw_config = serde_json::to_value(&config).unwrap_or(Value::Null);
        Self {
            label: label.into(),
            config,
            raw_config,
        }
    }

    /// Build from a stored config value; the typed view is derived leniently.
    pub fn from_raw(label: impl Into<String>, raw_config: Value) -> Self
    where
        C: DeserializeOwned + Default,
    {
        Self {
            label: label.into(),
            config: lenient::view(&raw_config),
            raw_config,
        }
    }

    /// The config exactly as it was loaded (or built). `Null` when absent.
    pub fn raw_config(&self) -> &Value {
        &self.raw_config
    }
}

impl<C> Serialize for NodeData<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut data = serializer.serialize_struct("NodeData", 2)?;
        data.serialize_field("label", &self.label)?;
        if self.raw_config.is_null() {
            data.skip_field("config")?;
        } else {
            data.serialize_field("config", &self.raw_config)?;
        }
        data.end()
    }
}

impl<'de, C> Deserialize<'de> for NodeData<C>
where
    C: DeserializeOwned + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default, deserialize_with = "lenient::label")]
            label: String,
            #[serde(default)]
            config: Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(NodeData::from_raw(raw.label, raw.config))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "C: DeserializeOwned + Default"))]
pub struct NodeBase<C> {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData<C>,
}

impl<C: Serialize> NodeBase<C> {
    pub fn new(id: impl Into<String>, position: Position, label: impl Into<String>, config: C) -> Self {
        Self {
            id: id.into(),
            position,
            data: NodeData::new(label, config),
        }
    }
}

// =============================================================================
// WORKFLOW NODE: tagged union over 7 node types, plus unknown types
// =============================================================================

/// Serialized with the type name in a `"type"` field next to the base fields.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowNode {
    Trigger(NodeBase<TriggerConfig>),
    Audience(NodeBase<AudienceConfig>),
    Condition(NodeBase<ConditionConfig>),
    Sms(NodeBase<SmsConfig>),
    Whatsapp(NodeBase<WhatsAppConfig>),
    Notification(NodeBase<NotificationConfig>),
    Delay(NodeBase<DelayConfig>),
    Other(OtherNode),
}

/// A node whose `type` the engine does not recognize. It has no typed
/// config; the raw one is carried through.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherNode {
    pub node_type: String,
    pub base: NodeBase<()>,
}

/// Expands `$body` once per variant with `$n` bound to the `NodeBase`.
macro_rules! with_base {
    ($node:expr, $n:ident => $body:expr) => {
        match $node {
            WorkflowNode::Trigger($n) => $body,
            WorkflowNode::Audience($n) => $body,
            WorkflowNode::Condition($n) => $body,
            WorkflowNode::Sms($n) => $body,
            WorkflowNode::Whatsapp($n) => $body,
            WorkflowNode::Notification($n) => $body,
            WorkflowNode::Delay($n) => $body,
            WorkflowNode::Other(OtherNode { base: $n, .. }) => $body,
        }
    };
}

impl Serialize for WorkflowNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, B> {
            #[serde(rename = "type")]
            node_type: &'a str,
            #[serde(flatten)]
            base: &'a B,
        }

        let node_type = self.type_name();
        with_base!(self, n => Tagged { node_type, base: n }.serialize(serializer))
    }
}

impl<'de> Deserialize<'de> for WorkflowNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn base<C, E>(value: Value) -> Result<NodeBase<C>, E>
        where
            C: DeserializeOwned + Default,
            E: de::Error,
        {
            NodeBase::deserialize(value).map_err(E::custom)
        }

        let value = Value::deserialize(deserializer)?;
        let type_name = match value.get("type") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(de::Error::custom("node `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };

        Ok(match NodeType::from_name(&type_name) {
            NodeType::Trigger => WorkflowNode::Trigger(base(value)?),
            NodeType::Audience => WorkflowNode::Audience(base(value)?),
            NodeType::Condition => WorkflowNode::Condition(base(value)?),
            NodeType::Sms => WorkflowNode::Sms(base(value)?),
            NodeType::Whatsapp => WorkflowNode::Whatsapp(base(value)?),
            NodeType::Notification => WorkflowNode::Notification(base(value)?),
            NodeType::Delay => WorkflowNode::Delay(base(value)?),
            NodeType::Other => WorkflowNode::Other(OtherNode {
                node_type: type_name,
                base: base(value)?,
            }),
        })
    }
}

impl WorkflowNode {
    /// A node of the given type with its default label and editor config.
    pub fn new(node_type: NodeType, id: impl Into<String>, position: Position) -> Self {
        let label = node_type.default_label();
        match node_type {
            NodeType::Trigger => {
                WorkflowNode::Trigger(NodeBase::new(id, position, label, TriggerConfig::editor_default()))
            }
            NodeType::Audience => {
                WorkflowNode::Audience(NodeBase::new(id, position, label, AudienceConfig::editor_default()))
            }
            NodeType::Condition => WorkflowNode::Condition(NodeBase::new(
                id,
                position,
                label,
                ConditionConfig::editor_default(),
            )),
            NodeType::Sms => WorkflowNode::Sms(NodeBase::new(id, position, label, SmsConfig::editor_default())),
            NodeType::Whatsapp => {
                WorkflowNode::Whatsapp(NodeBase::new(id, position, label, WhatsAppConfig::editor_default()))
            }
            NodeType::Notification => WorkflowNode::Notification(NodeBase::new(
                id,
                position,
                label,
                NotificationConfig::editor_default(),
            )),
            NodeType::Delay => WorkflowNode::Delay(NodeBase::new(id, position, label, DelayConfig::editor_default())),
            NodeType::Other => WorkflowNode::Other(OtherNode {
                node_type: NodeType::Other.as_str().to_string(),
                base: NodeBase::new(id, position, label, ()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        with_base!(self, n => &n.id)
    }

    pub fn label(&self) -> &str {
        with_base!(self, n => &n.data.label)
    }

    pub fn position(&self) -> Position {
        with_base!(self, n => n.position)
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            WorkflowNode::Trigger(_) => NodeType::Trigger,
            WorkflowNode::Audience(_) => NodeType::Audience,
            WorkflowNode::Condition(_) => NodeType::Condition,
            WorkflowNode::Sms(_) => NodeType::Sms,
            WorkflowNode::Whatsapp(_) => NodeType::Whatsapp,
            WorkflowNode::Notification(_) => NodeType::Notification,
            WorkflowNode::Delay(_) => NodeType::Delay,
            WorkflowNode::Other(_) => NodeType::Other,
        }
    }

    /// The `type` string as written in the graph, including unknown ones.
    pub fn type_name(&self) -> &str {
        match self {
            WorkflowNode::Other(other) => &other.node_type,
            known => known.node_type().as_str(),
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, WorkflowNode::Trigger(_))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, WorkflowNode::Condition(_))
    }

    /// The node's config as stored, untouched by the typed view.
    pub fn raw_config(&self) -> &Value {
        with_base!(self, n => n.data.raw_config())
    }

    /// Rename the node id in place. Used when cloning a graph.
    pub fn set_id(&mut self, id: String) {
        with_base!(self, n => n.id = id)
    }
}

/// Editor default config for a node type, as JSON.
pub fn default_config_value(node_type: NodeType) -> Value {
    WorkflowNode::new(node_type, "", Position::default())
        .raw_config()
        .clone()
}

// =============================================================================
// TRIGGER
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[default]
    Event,
    Schedule,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub schedule: Option<TriggerSchedule>,
}

impl TriggerConfig {
    pub fn editor_default() -> Self {
        Self {
            trigger_type: Some(TriggerType::Event),
            event_name: Some(String::new()),
            schedule: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSchedule {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

// =============================================================================
// AUDIENCE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceType {
    #[default]
    All,
    List,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceConfig {
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub audience_type: Option<AudienceType>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

impl AudienceConfig {
    pub fn editor_default() -> Self {
        Self {
            audience_type: Some(AudienceType::All),
            list_id: None,
        }
    }
}

// =============================================================================
// CONDITION
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Operators outside this set (including the editor's
    /// `greater_than`/`less_than`) read as absent here; the raw config keeps
    /// them.
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ConditionConfig {
    pub fn editor_default() -> Self {
        Self {
            field: Some(String::new()),
            operator: Some(ConditionOperator::Equals),
            value: Some(Value::String(String::new())),
        }
    }
}

// =============================================================================
// MESSAGING ACTIONS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsConfig {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SmsConfig {
    pub fn editor_default() -> Self {
        Self {
            sender_id: Some(String::new()),
            text: Some(String::new()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, String>>,
}

impl WhatsAppConfig {
    pub fn editor_default() -> Self {
        Self {
            template_id: Some(String::new()),
            variables: Some(BTreeMap::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InWorkspace,
    InOrganization,
    InChannel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub channel: Option<NotificationChannel>,
}

impl NotificationConfig {
    pub fn editor_default() -> Self {
        Self {
            title: Some(String::new()),
            body: Some(String::new()),
            channel: Some(NotificationChannel::InOrganization),
        }
    }
}

// =============================================================================
// DELAY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub minutes: Option<f64>,
}

impl DelayConfig {
    pub fn editor_default() -> Self {
        Self { minutes: Some(10.0) }
    }
}
