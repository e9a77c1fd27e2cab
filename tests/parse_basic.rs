//! Integration tests for the parse phase: JSON → Workflow → WorkflowGraph.

mod helpers;

use flowgraph::parse::{self, WorkflowGraph};
use flowgraph::parse::types::*;
use serde_json::json;

#[test]
fn parse_branching_fixture() {
    let json = include_str!("fixtures/branching_campaign.json");
    let workflow = parse::parse(json).expect("Should parse");
    assert_eq!(workflow.nodes.len(), 8);
    assert_eq!(workflow.edges.len(), 7);
    assert_eq!(workflow.count_nodes_of_type(NodeType::Sms), 2);

    let WorkflowNode::Trigger(trigger) = &workflow.nodes[0] else {
        panic!("first node should be the trigger");
    };
    assert_eq!(trigger.data.config.trigger_type, Some(TriggerType::Schedule));
    assert_eq!(
        trigger.data.config.schedule.as_ref().and_then(|s| s.at.as_deref()),
        Some("2026-01-01T09:00:00Z")
    );

    let WorkflowNode::Whatsapp(wa) = workflow.node("whatsapp-1").unwrap() else {
        panic!("whatsapp-1 should be a whatsapp node");
    };
    assert_eq!(wa.data.config.variables.as_ref().unwrap()["name"], "{{user.name}}");
}

#[test]
fn unknown_node_type_is_kept() {
    let json = r#"{"nodes":[
        {"id":"x","type":"webhook","position":{"x":4,"y":2},"data":{"label":"Hook","config":{"url":"https://example.test"}}}
    ],"edges":[]}"#;
    let workflow = parse::parse(json).expect("Should parse unknown types");

    let node = &workflow.nodes[0];
    assert_eq!(node.node_type(), NodeType::Other);
    assert_eq!(node.type_name(), "webhook");
    assert_eq!(node.label(), "Hook");
    assert_eq!(workflow.count_nodes_of_type(NodeType::Other), 1);

    let value = serde_json::to_value(node).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "webhook",
            "id": "x",
            "position": {"x": 4.0, "y": 2.0},
            "data": {"label": "Hook", "config": {"url": "https://example.test"}}
        })
    );
}

#[test]
fn node_without_type_is_rejected() {
    let err = parse::parse(r#"{"nodes":[{"id":"x","data":{}}]}"#).unwrap_err();
    assert!(err.to_string().contains("failed to parse workflow JSON"), "{err}");
    assert!(parse::parse(r#"{"nodes":[{"id":"x","type":7}]}"#).is_err());
}

#[test]
fn malformed_config_degrades_to_absent_fields() {
    let json = r#"{
        "nodes": [
            {"id":"d1","type":"delay","data":{"label":42,"config":{"minutes":"ten"}}},
            {"id":"a1","type":"audience","data":{"label":"A","config":"not an object"}},
            {"id":"c1","type":"condition","data":{"config":{"operator":"greater_than","value":null}}}
        ],
        "edges": [{"id":"e1","source":"d1","target":"a1","data":{"priority":"high"}}]
    }"#;
    let workflow = parse::parse(json).expect("Should parse despite bad fields");

    let WorkflowNode::Delay(delay) = &workflow.nodes[0] else { unreachable!() };
    assert_eq!(delay.data.label, "");
    assert_eq!(delay.data.config.minutes, None);

    let WorkflowNode::Audience(audience) = &workflow.nodes[1] else { unreachable!() };
    assert_eq!(audience.data.config, AudienceConfig::default());

    let WorkflowNode::Condition(condition) = &workflow.nodes[2] else { unreachable!() };
    assert_eq!(condition.data.config.operator, None);
    assert_eq!(condition.data.config.value, None);

    // The typed view is lenient; the stored config is not rewritten.
    assert_eq!(workflow.nodes[0].raw_config(), &json!({"minutes": "ten"}));
    assert_eq!(workflow.nodes[1].raw_config(), &json!("not an object"));
    assert_eq!(
        workflow.nodes[2].raw_config(),
        &json!({"operator": "greater_than", "value": null})
    );

    assert_eq!(workflow.edges[0].priority(), None);
}

#[test]
fn missing_position_and_data_default() {
    let workflow = parse::parse(r#"{"nodes":[{"id":"s1","type":"sms"}]}"#).unwrap();
    assert_eq!(workflow.nodes[0].position(), Position::default());
    assert_eq!(workflow.nodes[0].label(), "");
    assert!(workflow.edges.is_empty());
}

#[test]
fn editor_defaults_per_type() {
    let expected = [
        (NodeType::Trigger, json!({"triggerType": "event", "eventName": ""})),
        (NodeType::Audience, json!({"audienceType": "all"})),
        (NodeType::Condition, json!({"field": "", "operator": "equals", "value": ""})),
        (NodeType::Sms, json!({"senderId": "", "text": ""})),
        (NodeType::Whatsapp, json!({"templateId": "", "variables": {}})),
        (NodeType::Notification, json!({"title": "", "body": "", "channel": "in_organization"})),
        (NodeType::Delay, json!({"minutes": 10.0})),
    ];
    for (node_type, config) in expected {
        assert_eq!(default_config_value(node_type), config, "defaults for {node_type}");
    }
    assert_eq!(NodeType::Condition.default_label(), "IF / ELSE");
}

#[test]
fn node_serializes_with_type_tag() {
    let node = helpers::node(NodeType::Delay, "d1");
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["type"], "delay");
    assert_eq!(value["data"]["label"], "Delay");
    assert_eq!(value["data"]["config"]["minutes"], 10.0);
}

#[test]
fn graph_reports_incoming_and_outgoing() {
    let workflow = helpers::load(include_str!("fixtures/branching_campaign.json"));
    let graph = WorkflowGraph::build(&workflow);

    let outgoing: Vec<&str> = graph
        .outgoing_by_source("condition-1")
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(outgoing, vec!["e3", "e4"], "insertion order is preserved");
    assert_eq!(graph.successors("whatsapp-1"), vec!["notification-1", "sms-2"]);
    assert_eq!(graph.incoming_count("condition-1"), 1);
    assert!(!graph.has_incoming("trigger-1"));
    assert!(!graph.has_outgoing("sms-1"));
    assert!(graph.has_path("trigger-1", "sms-2"));
    assert!(!graph.has_path("sms-2", "trigger-1"));
    assert_eq!(graph.reachable_from("trigger-1").len(), 8);
    assert!(!graph.is_cyclic());
}

#[test]
fn parse_and_build_hands_out_graph() {
    let json = include_str!("fixtures/broken_graph.json");
    let (nodes, ghost_known) =
        parse::parse_and_build(json, |wf, graph| (wf.nodes.len(), graph.contains_node("ghost")))
            .unwrap();
    assert_eq!(nodes, 6);
    assert!(!ghost_known, "dangling endpoints are not nodes");
}
