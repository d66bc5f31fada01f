//! Batch execution end to end: JSON operations in, ledger and document out.

use proptest::prelude::*;
use serde_json::json;

use board_core::{BoardDocument, GraphStore};
use board_ops::{ErrorKind, Operation, OperationKind, OperationsService};

fn parse(ops: serde_json::Value) -> Vec<Operation> {
    serde_json::from_value(ops).unwrap()
}

#[test]
fn scrambled_batch_still_connects_placeholders() {
    let ops = parse(json!([
        {"op": "create_edge", "fromNode": "ref", "toNode": "ref2", "toEnd": "arrow"},
        {"op": "create_text_node", "ref": "ref2", "text": "second",
         "position": {"kind": "absolute", "x": 400, "y": 0}},
        {"op": "create_text_node", "ref": "ref", "text": "first"}
    ]));
    let mut svc = OperationsService::default();
    let report = svc.execute_batch(&ops);

    assert_eq!(report.failure_count(), 0, "{:?}", report);
    let edge = &report.document.edges[0];
    assert_eq!(edge.from_node.as_str(), svc.resolve("ref"));
    assert_eq!(edge.to_node.as_str(), svc.resolve("ref2"));
}

#[test]
fn relative_anchor_created_later_in_node_phase_fails_cleanly() {
    // Within the node phase order is preserved, so anchoring on a
    // placeholder created afterwards cannot resolve.
    let ops = parse(json!([
        {"op": "create_text_node", "ref": "b", "text": "b",
         "position": {"kind": "near", "nodeId": "a"}},
        {"op": "create_text_node", "ref": "a", "text": "a"}
    ]));
    let mut svc = OperationsService::default();
    let report = svc.execute_batch(&ops);
    assert!(!report.nodes[0].success);
    assert_eq!(report.nodes[0].error_kind, Some(ErrorKind::NotFound));
    assert!(report.nodes[1].success);
}

#[test]
fn partial_failure_does_not_abort() {
    let ops = parse(json!([
        {"op": "create_text_node", "ref": "a", "text": "a"},
        {"op": "create_edge", "fromNode": "a", "toNode": "missing"},
        {"op": "create_link_node", "ref": "b", "url": "https://example.com"},
        {"op": "create_file_node", "ref": "c", "file": "notes/today.md"}
    ]));
    let mut svc = OperationsService::default();
    let report = svc.execute_batch(&ops);

    assert_eq!(report.nodes.len(), 3);
    assert!(report.nodes.iter().all(|o| o.success));
    assert_eq!(report.edges.len(), 1);
    assert!(!report.edges[0].success);
    assert_eq!(report.edges[0].operation, Some(OperationKind::CreateEdge));
    let message = report.edges[0].message.as_deref().unwrap();
    assert!(message.contains("target"), "{}", message);
    assert_eq!(report.document.nodes.len(), 3);
    assert!(report.document.edges.is_empty());
}

#[test]
fn grid_group_is_deterministic() {
    let ops = parse(json!([
        {"op": "build_group", "ref": "g", "label": "Plan", "layout": "grid", "gridColumns": 2,
         "position": {"kind": "absolute", "x": 0, "y": 0},
         "children": [
            {"type": "text", "text": "a", "size": {"width": 120, "height": 60}},
            {"type": "link", "url": "https://x", "size": {"width": 300, "height": 100}},
            {"type": "file", "file": "f.md", "size": {"width": 200, "height": 220}}
         ]}
    ]));
    let origins = |svc: &OperationsService| -> Vec<(f64, f64)> {
        svc.store().nodes().skip(1).map(|n| (n.x, n.y)).collect()
    };

    let mut first = OperationsService::default();
    first.execute_batch(&ops);
    let mut second = OperationsService::default();
    second.execute_batch(&ops);

    assert_eq!(origins(&first), origins(&second));
    assert_eq!(origins(&first), vec![(20.0, 20.0), (240.0, 20.0), (20.0, 140.0)]);
}

#[test]
fn batch_over_existing_document_keeps_existing_ids() {
    let doc = BoardDocument::from_json(
        r#"{"nodes":[{"id":"keep","type":"text","text":"old","x":0,"y":0,"width":250,"height":60}],"edges":[]}"#,
    )
    .unwrap();
    let mut svc = OperationsService::new(GraphStore::from_document(doc));
    let ops = parse(json!([
        {"op": "append_text", "id": "keep", "content": " and new"},
        {"op": "create_text_node", "ref": "n", "text": "n",
         "position": {"kind": "relative", "nodeId": "keep", "direction": "below"}},
        {"op": "create_edge", "fromNode": "keep", "toNode": "n"}
    ]));
    let report = svc.execute_batch(&ops);
    assert_eq!(report.failure_count(), 0);
    let kept = report.document.node("keep").unwrap();
    assert_eq!(kept.text(), Some("old and new"));
    let created = report.document.node(&svc.resolve("n")).unwrap();
    assert_eq!((created.x, created.y), (0.0, 110.0));
}

#[test]
fn placeholder_cannot_take_over_an_existing_id() {
    let doc = BoardDocument::from_json(
        r#"{"nodes":[
            {"id":"keep","type":"text","text":"old","x":0,"y":0,"width":250,"height":60},
            {"id":"other","type":"text","text":"o","x":300,"y":0,"width":250,"height":60}
        ],"edges":[{"id":"link","fromNode":"other","toNode":"keep"}]}"#,
    )
    .unwrap();
    let mut svc = OperationsService::new(GraphStore::from_document(doc));
    let ops = parse(json!([
        {"op": "create_text_node", "ref": "keep", "text": "impostor"},
        {"op": "update_node", "id": "keep", "text": "edited"},
        {"op": "create_edge", "ref": "link", "fromNode": "keep", "toNode": "other"},
        {"op": "create_edge", "fromNode": "other", "toNode": "keep"}
    ]));
    let report = svc.execute_batch(&ops);

    assert!(!report.nodes[0].success);
    assert_eq!(report.nodes[0].error_kind, Some(ErrorKind::Validation));
    assert!(report.nodes[1].success);
    assert!(!report.edges[0].success);
    assert_eq!(report.edges[0].error_kind, Some(ErrorKind::Validation));
    assert!(report.edges[1].success);

    assert_eq!(svc.resolve("keep"), "keep");
    assert_eq!(svc.resolve("link"), "link");
    assert_eq!(report.document.nodes.len(), 2);
    assert_eq!(report.document.node("keep").unwrap().text(), Some("edited"));
    let added = report.document.edges.last().unwrap();
    assert_eq!(added.to_node.as_str(), "keep");
}

fn op_strategy() -> impl Strategy<Value = serde_json::Value> {
    let name = prop::sample::select(vec!["a", "b", "c", "d"]);
    prop_oneof![
        name.clone()
            .prop_map(|r| json!({"op": "create_text_node", "ref": r, "text": r})),
        name.clone().prop_map(|r| json!({"op": "delete_node", "id": r})),
        name.clone()
            .prop_map(|r| json!({"op": "append_text", "id": r, "content": "+"})),
        (name.clone(), name.clone())
            .prop_map(|(f, t)| json!({"op": "create_edge", "fromNode": f, "toNode": t})),
        name.prop_map(|r| json!({"op": "delete_edge", "id": r})),
    ]
}

proptest! {
    #[test]
    fn every_operation_is_reported_once(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let ops: Vec<Operation> = serde_json::from_value(serde_json::Value::Array(ops)).unwrap();
        let mut svc = OperationsService::default();
        let report = svc.execute_batch(&ops);

        let mut indices: Vec<usize> = report.outcomes().map(|o| o.index).collect();
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..ops.len()).collect::<Vec<_>>());

        for edge in &report.document.edges {
            prop_assert!(report.document.node(edge.from_node.as_str()).is_some());
            prop_assert!(report.document.node(edge.to_node.as_str()).is_some());
        }
    }
}
