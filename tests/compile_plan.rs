//! Integration tests for the execution-plan compiler.

mod helpers;

use flowgraph::ir::*;
use flowgraph::lower::build_workflow_execution;
use flowgraph::parse::types::*;
use helpers::*;
use serde_json::json;

fn codes(plan: &ExecutionPlan) -> Vec<WarningCode> {
    plan.warnings.iter().map(|w| w.code).collect()
}

#[test]
fn linear_chain_compiles_in_order() {
    let plan = build_workflow_execution(&load(include_str!("fixtures/linear_welcome.json")));

    assert_eq!(plan.entry.as_deref(), Some("T1"));
    assert_eq!(plan.order, vec!["T1", "D1", "S1"]);
    assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);

    let delay = plan.node("D1").unwrap();
    assert_eq!(delay.kind, ExecutionKind::Delay);
    assert_eq!(delay.runtime, NodeRuntime::Delay(DelayRuntime { delay_ms: 300_000 }));
    assert_eq!(
        delay.next,
        ExecutionNext::Single {
            node_id: "S1".into(),
            edge_id: "e-D1-S1".into(),
        }
    );
    assert_eq!(plan.node("S1").unwrap().next, ExecutionNext::End);

    let value = serde_json::to_value(&plan).unwrap();
    assert_eq!(value["nodes"]["D1"]["runtime"]["delayMs"], 300_000);
    assert_eq!(value["nodes"]["D1"]["next"]["mode"], "single");
    assert_eq!(value["nodes"]["D1"]["next"]["nodeId"], "S1");
    assert_eq!(value["nodes"]["S1"]["next"], json!({"mode": "end"}));
    assert_eq!(value["nodes"]["T1"]["runtime"], json!({"triggerType": "event", "eventName": "user.signed_up"}));
}

#[test]
fn branching_campaign_wires_branches_and_fan_out() {
    let plan = build_workflow_execution(&load(include_str!("fixtures/branching_campaign.json")));

    assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
    assert_eq!(
        plan.order,
        vec![
            "trigger-1",
            "audience-1",
            "condition-1",
            "delay-1",
            "sms-1",
            "whatsapp-1",
            "notification-1",
            "sms-2",
        ]
    );

    let trigger = plan.node("trigger-1").unwrap();
    assert_eq!(
        trigger.runtime,
        NodeRuntime::Trigger(TriggerRuntime {
            trigger_type: TriggerType::Schedule,
            event_name: None,
            schedule_at: Some("2026-01-01T09:00:00Z".into()),
        })
    );

    let condition = plan.node("condition-1").unwrap();
    assert_eq!(condition.kind, ExecutionKind::Branch);
    let NodeRuntime::Branch(branch) = &condition.runtime else {
        panic!("condition should carry a rule");
    };
    assert_eq!(branch.rule.field, "plan");
    assert_eq!(branch.rule.operator, ConditionOperator::Equals);
    assert_eq!(branch.rule.value, json!("pro"));
    assert_eq!(
        serde_json::to_value(&condition.next).unwrap(),
        json!({
            "mode": "branch",
            "if": { "nodeId": "whatsapp-1", "edgeId": "e4" },
            "else": { "nodeId": "delay-1", "edgeId": "e3" }
        })
    );

    let whatsapp = plan.node("whatsapp-1").unwrap();
    assert_eq!(
        whatsapp.next,
        ExecutionNext::Sequential {
            node_ids: vec!["sms-2".into(), "notification-1".into()],
            edge_ids: vec!["e6".into(), "e5".into()],
        }
    );
    assert_eq!(
        whatsapp.runtime,
        NodeRuntime::Action(ActionRuntime {
            channel: Some(Channel::Whatsapp),
            priority: 10,
        })
    );

    let delay = plan.node("delay-1").unwrap();
    assert_eq!(delay.runtime, NodeRuntime::Delay(DelayRuntime { delay_ms: 3_600_000 }));
    assert_eq!(plan.node("audience-1").unwrap().label.as_deref(), Some("VIP list"));
}

#[test]
fn broken_graph_compiles_with_warnings() {
    init_tracing();
    let plan = build_workflow_execution(&load(include_str!("fixtures/broken_graph.json")));

    assert_eq!(plan.entry.as_deref(), Some("t1"));
    assert_eq!(plan.order, vec!["t1", "c1", "w1", "d1", "t2"]);
    assert_eq!(
        codes(&plan),
        vec![
            WarningCode::MultipleTriggers,
            WarningCode::UnreachableNode,
            WarningCode::CycleDetected,
            WarningCode::MissingConditionBranch,
        ]
    );
    assert_eq!(plan.warnings[1].node_id.as_deref(), Some("n1"));
    assert_eq!(plan.warnings[2].node_id.as_deref(), Some("w1"));
    assert_eq!(plan.warnings[3].node_id.as_deref(), Some("c1"));

    // Trigger-typed targets sort ahead of actions.
    assert_eq!(
        plan.node("d1").unwrap().next,
        ExecutionNext::Single {
            node_id: "t2".into(),
            edge_id: "e5".into(),
        }
    );
    assert_eq!(
        plan.node("c1").unwrap().next,
        ExecutionNext::Branch {
            if_branch: None,
            else_branch: None,
        }
    );
    assert_eq!(
        serde_json::to_value(&plan.warnings[0]).unwrap(),
        json!({
            "code": "MULTIPLE_TRIGGERS",
            "message": "Multiple triggers found (2). Using the first one."
        })
    );
}

#[test]
fn no_entry_yields_empty_plan() {
    let wf = workflow(
        vec![node(NodeType::Sms, "s1"), node(NodeType::Delay, "d1")],
        vec![edge("e1", "s1", "d1"), edge("e2", "d1", "s1")],
    );
    let plan = build_workflow_execution(&wf);
    assert_eq!(plan.entry, None);
    assert!(plan.order.is_empty());
    assert!(plan.nodes.is_empty());
    assert_eq!(
        codes(&plan),
        vec![WarningCode::NoEntry, WarningCode::UnreachableNode, WarningCode::UnreachableNode]
    );
    assert_eq!(serde_json::to_value(&plan).unwrap()["entry"], json!(null));

    let empty = build_workflow_execution(&Workflow::default());
    assert_eq!(codes(&empty), vec![WarningCode::NoEntry]);
}

#[test]
fn root_fallback_without_trigger() {
    let wf = workflow(
        vec![node(NodeType::Sms, "s1"), node(NodeType::Audience, "a1")],
        vec![edge("e1", "a1", "s1")],
    );
    let plan = build_workflow_execution(&wf);
    assert_eq!(plan.entry.as_deref(), Some("a1"));
    assert_eq!(plan.order, vec!["a1", "s1"]);
    assert!(plan.warnings.is_empty());
}

#[test]
fn unknown_node_types_compile_as_actions() {
    let wf = load(
        r#"{
        "nodes": [
            {"id":"t1","type":"trigger","data":{"config":{}}},
            {"id":"x1","type":"webhook","data":{"label":"Hook","config":{"url":"https://example.test"}}},
            {"id":"s1","type":"sms","data":{"config":{"text":"hi"}}},
            {"id":"x2","type":"webhook","data":{}}
        ],
        "edges": [
            {"id":"e1","source":"t1","target":"x1"},
            {"id":"e2","source":"x1","target":"x2"},
            {"id":"e3","source":"x1","target":"s1"}
        ]
    }"#,
    );
    let plan = build_workflow_execution(&wf);

    assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
    assert_eq!(plan.order, vec!["t1", "x1", "x2", "s1"]);

    let hook = plan.node("x1").unwrap();
    assert_eq!(hook.node_type, "webhook");
    assert_eq!(hook.kind, ExecutionKind::Action);
    assert_eq!(
        hook.runtime,
        NodeRuntime::Action(ActionRuntime {
            channel: None,
            priority: 999,
        })
    );
    // Unknown targets sort after every known action.
    assert_eq!(
        hook.next,
        ExecutionNext::Sequential {
            node_ids: vec!["s1".into(), "x2".into()],
            edge_ids: vec!["e3".into(), "e2".into()],
        }
    );
    assert_eq!(plan.node("x2").unwrap().config, None);

    let value = serde_json::to_value(&plan).unwrap();
    assert_eq!(value["nodes"]["x1"]["type"], "webhook");
    assert_eq!(value["nodes"]["x1"]["runtime"], json!({"priority": 999}));
    assert_eq!(value["nodes"]["x1"]["config"], json!({"url": "https://example.test"}));
    assert!(validate_plan(&plan).is_empty());

    let restored: ExecutionPlan = serde_json::from_str(&value.to_string()).unwrap();
    assert_eq!(restored, plan);
}

#[test]
fn duplicate_ids_resolve_to_the_last_node() {
    let wf = workflow(
        vec![
            node(NodeType::Trigger, "t1"),
            node(NodeType::Sms, "s1"),
            node(NodeType::Delay, "x"),
            node(NodeType::Whatsapp, "x"),
        ],
        vec![edge("e1", "t1", "s1"), edge("e2", "s1", "x")],
    );
    let plan = build_workflow_execution(&wf);
    assert_eq!(plan.order, vec!["t1", "s1", "x"]);
    assert_eq!(plan.node("x").unwrap().node_type, "whatsapp");
}

#[test]
fn explicit_priority_reorders_fan_out() {
    let wf = workflow(
        vec![
            node(NodeType::Trigger, "t1"),
            node(NodeType::Sms, "s1"),
            node(NodeType::Whatsapp, "w1"),
            node(NodeType::Notification, "n1"),
        ],
        vec![
            edge("e1", "t1", "s1"),
            edge("b", "s1", "w1"),
            edge("a", "s1", "n1").with_priority(1.0),
        ],
    );
    let plan = build_workflow_execution(&wf);
    assert_eq!(
        plan.node("s1").unwrap().next,
        ExecutionNext::Sequential {
            node_ids: vec!["n1".into(), "w1".into()],
            edge_ids: vec!["a".into(), "b".into()],
        }
    );
}

#[test]
fn compilation_is_deterministic() {
    for json in [
        include_str!("fixtures/branching_campaign.json"),
        include_str!("fixtures/broken_graph.json"),
        include_str!("fixtures/linear_welcome.json"),
    ] {
        let wf = load(json);
        let first = serde_json::to_string(&build_workflow_execution(&wf)).unwrap();
        let second = serde_json::to_string(&build_workflow_execution(&wf)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn order_and_nodes_cover_the_same_ids() {
    for json in [
        include_str!("fixtures/branching_campaign.json"),
        include_str!("fixtures/broken_graph.json"),
        include_str!("fixtures/empty_sms.json"),
        include_str!("fixtures/linear_welcome.json"),
    ] {
        let plan = build_workflow_execution(&load(json));
        let keys: Vec<&String> = plan.nodes.keys().collect();
        let order: Vec<&String> = plan.order.iter().collect();
        assert_eq!(keys, order, "nodes map keeps plan order");
        assert!(validate_plan(&plan).is_empty(), "{:?}", validate_plan(&plan));
    }
}

#[test]
fn plan_survives_storage() {
    let plan = build_workflow_execution(&load(include_str!("fixtures/branching_campaign.json")));
    let json = serde_json::to_string(&plan).unwrap();
    let restored: ExecutionPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, plan);
}

#[test]
fn fan_out_plan_snapshot() {
    let wf = workflow(
        vec![
            configured(NodeType::Trigger, "t1", json!({ "triggerType": "manual" })),
            configured(NodeType::Audience, "a1", json!({ "audienceType": "list", "listId": "vip" })),
            configured(NodeType::Whatsapp, "w1", json!({ "templateId": "promo" })),
            configured(NodeType::Notification, "n1", json!({ "title": "Sent" })),
            configured(NodeType::Sms, "s1", json!({ "text": "hi" })),
        ],
        vec![
            edge("e1", "t1", "a1"),
            edge("e2", "a1", "w1"),
            edge("e3", "w1", "n1"),
            edge("e4", "w1", "s1"),
        ],
    );
    let plan = build_workflow_execution(&wf);

    insta::assert_json_snapshot!(plan, @r#"
    {
      "entry": "t1",
      "order": [
        "t1",
        "a1",
        "w1",
        "n1",
        "s1"
      ],
      "nodes": {
        "t1": {
          "id": "t1",
          "type": "trigger",
          "kind": "trigger",
          "label": "Trigger",
          "config": {
            "triggerType": "manual"
          },
          "runtime": {
            "triggerType": "manual"
          },
          "next": {
            "mode": "single",
            "nodeId": "a1",
            "edgeId": "e1"
          }
        },
        "a1": {
          "id": "a1",
          "type": "audience",
          "kind": "audience",
          "label": "Audience",
          "config": {
            "audienceType": "list",
            "listId": "vip"
          },
          "runtime": {
            "audienceType": "list",
            "listId": "vip"
          },
          "next": {
            "mode": "single",
            "nodeId": "w1",
            "edgeId": "e2"
          }
        },
        "w1": {
          "id": "w1",
          "type": "whatsapp",
          "kind": "action",
          "label": "Send WhatsApp",
          "config": {
            "templateId": "promo"
          },
          "runtime": {
            "channel": "whatsapp",
            "priority": 10
          },
          "next": {
            "mode": "sequential",
            "nodeIds": [
              "s1",
              "n1"
            ],
            "edgeIds": [
              "e4",
              "e3"
            ]
          }
        },
        "n1": {
          "id": "n1",
          "type": "notification",
          "kind": "action",
          "label": "Send Notification",
          "config": {
            "title": "Sent"
          },
          "runtime": {
            "channel": "notification",
            "priority": 30
          },
          "next": {
            "mode": "end"
          }
        },
        "s1": {
          "id": "s1",
          "type": "sms",
          "kind": "action",
          "label": "Send SMS",
          "config": {
            "text": "hi"
          },
          "runtime": {
            "channel": "sms",
            "priority": 20
          },
          "next": {
            "mode": "end"
          }
        }
      },
      "warnings": []
    }
    "#);
}
