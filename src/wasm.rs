//! WASM entry points for browser use.
//!
//! Every function takes JSON strings from the editor and returns a plain JS
//! object. Unreadable input yields `{status: "error", message}`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::WorkflowError;
use crate::parse::types::{NodeType, default_config_value};
use crate::validate::{Connection, ConnectionVerdict};

/// Check one proposed edge against the current graph.
/// Returns `{valid, reasonKey?, reasonParams?}`.
#[wasm_bindgen]
pub fn validate_connection(connection_json: &str, workflow_json: &str) -> JsValue {
    to_js(&validate_connection_inner(connection_json, workflow_json))
}

fn validate_connection_inner(connection_json: &str, workflow_json: &str) -> Reply<ConnectionVerdict> {
    let connection = match serde_json::from_str::<Connection>(connection_json) {
        Ok(c) => c,
        Err(e) => return Reply::error(format!("Failed to parse connection JSON: {e}")),
    };
    let workflow = match crate::parse::parse(workflow_json) {
        Ok(w) => w,
        Err(e) => return Reply::from(e),
    };
    Reply::Ok(crate::validate::validate_connection(&connection, &workflow).into())
}

/// Validate a whole workflow graph. Returns `{valid, issues}`.
#[wasm_bindgen]
pub fn validate_workflow(json: &str) -> JsValue {
    to_js(&validate_workflow_inner(json))
}

fn validate_workflow_inner(json: &str) -> Reply<crate::validate::WorkflowValidation> {
    match crate::parse::parse(json) {
        Ok(workflow) => Reply::Ok(crate::validate::validate_workflow(&workflow)),
        Err(e) => Reply::from(e),
    }
}

/// Compile a workflow graph into its execution plan.
#[wasm_bindgen]
pub fn build_workflow_execution(json: &str) -> JsValue {
    to_js(&build_workflow_execution_inner(json))
}

fn build_workflow_execution_inner(json: &str) -> Reply<crate::ir::ExecutionPlan> {
    match crate::parse::parse(json) {
        Ok(workflow) => Reply::Ok(crate::lower::build_workflow_execution(&workflow)),
        Err(e) => Reply::from(e),
    }
}

/// Default config object for a palette node type (e.g. `"delay"`).
#[wasm_bindgen]
pub fn default_node_config(node_type: &str) -> JsValue {
    to_js(&default_node_config_inner(node_type))
}

fn default_node_config_inner(node_type: &str) -> Reply<serde_json::Value> {
    match node_type.parse::<NodeType>() {
        Ok(t) => Reply::Ok(default_config_value(t)),
        Err(e) => Reply::error(e.to_string()),
    }
}

/// Maps become plain objects, not JS `Map`s, so the editor can read the plan
/// the same way it reads stored JSON.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct ErrorDto {
    status: &'static str,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum Reply<T> {
    Ok(T),
    Error(ErrorDto),
}

impl<T> Reply<T> {
    fn error(message: String) -> Self {
        Reply::Error(ErrorDto {
            status: "error",
            message,
        })
    }
}

impl<T> From<WorkflowError> for Reply<T> {
    fn from(e: WorkflowError) -> Self {
        Reply::error(e.to_string())
    }
}
