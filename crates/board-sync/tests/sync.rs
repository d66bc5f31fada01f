//! Full reconciliation cycles against the in-memory host.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use board_core::{BoardDocument, Side};
use board_sync::{HostDocument, InMemoryHost, PersistPolicy, SyncAdapter, SyncConfig};

const HOST_DOC: &str = r#"{
  "nodes": [
    {"id": "keep", "type": "text", "text": "existing", "x": 0, "y": 0, "width": 250, "height": 60}
  ],
  "edges": []
}"#;

fn adapter_with(doc: &str, persist: PersistPolicy) -> SyncAdapter<InMemoryHost> {
    let host = InMemoryHost::new(BoardDocument::from_json(doc).unwrap());
    SyncAdapter::new(Arc::new(host), SyncConfig::default().with_persist(persist))
}

#[tokio::test]
async fn created_nodes_and_edges_land_with_host_ids() {
    let sync = adapter_with(HOST_DOC, PersistPolicy::immediate());
    let report = sync
        .apply(&[
            json!({"action": "add_edge", "from": "keep", "to": "idea"}),
            json!({"action": "add_node", "node": {"type": "text", "content": "new idea"},
                   "ref": "idea", "relativeTo": "keep", "direction": "right"}),
        ])
        .await;

    assert!(report.success, "{:?}", report);
    assert_eq!(report.failure_count(), 0);

    let doc = sync.host().snapshot();
    assert_eq!(doc.nodes.len(), 2);
    let created = &doc.nodes[1];
    assert_eq!((created.x, created.y), (300.0, 0.0));
    assert!(report.id_map.values().any(|v| v == created.id.as_str()));
    assert!(!report.id_map.contains_key(created.id.as_str()));

    let edge = &doc.edges[0];
    assert_eq!(edge.from_node.as_str(), "keep");
    assert_eq!(edge.to_node, created.id);
    assert_eq!(edge.from_side, Some(Side::Right));
    assert_eq!(edge.to_side, Some(Side::Left));

    // Results are reported in submitted order with host ids.
    assert_eq!(report.results[0].index, 0);
    assert_eq!(report.results[0].id.as_deref(), Some(edge.id.as_str()));
    assert_eq!(report.results[1].id.as_deref(), Some(created.id.as_str()));
}

#[tokio::test]
async fn follow_up_persists_run_in_the_background() {
    let sync = adapter_with(HOST_DOC, PersistPolicy::from_millis(&[10, 10]));
    let report = sync
        .apply(&[json!({"action": "update_node", "id": "keep", "color": "4"})])
        .await;
    assert!(report.success);
    assert_eq!(sync.host().persist_count(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sync.host().persist_count(), 3);
    assert_eq!(sync.host().write_count(), 1);
}

#[tokio::test]
async fn every_call_rereads_the_host() {
    let sync = adapter_with(HOST_DOC, PersistPolicy::immediate());
    sync.apply(&[json!({"action": "add_node", "type": "link", "url": "https://a"})])
        .await;

    // Another writer adds a node between calls.
    let mut doc = sync.host().snapshot();
    let mut foreign = doc.nodes[0].clone();
    foreign.id = "foreign".into();
    doc.nodes.push(foreign);
    sync.host().write_document(&doc).unwrap();

    let report = sync
        .apply(&[json!({"action": "add_edge", "fromNode": "foreign", "toNode": "keep"})])
        .await;
    assert!(report.results[0].success, "{:?}", report.results);
    let after = sync.host().snapshot();
    assert_eq!(after.nodes.len(), 3);
    assert!(after.node("foreign").is_some());
}

#[tokio::test]
async fn unknown_ids_fail_per_operation_only() {
    let sync = adapter_with(HOST_DOC, PersistPolicy::immediate());
    let report = sync
        .apply(&[
            json!({"action": "remove_node", "id": "ghost"}),
            json!({"action": "update_node", "id": "keep", "text": "edited"}),
            json!({"action": "add_node", "type": "file"}),
        ])
        .await;
    assert!(report.success);
    assert_eq!(report.failure_count(), 2);
    let message = report.results[2].message.as_deref().unwrap();
    assert!(message.contains("file"), "{}", message);
    assert_eq!(sync.host().snapshot().node("keep").unwrap().text(), Some("edited"));
}

#[tokio::test]
async fn written_document_keeps_integer_coordinates() {
    let sync = adapter_with(HOST_DOC, PersistPolicy::immediate());
    sync.apply(&[json!({"action": "add_node", "type": "text", "text": "t", "pos": [10, 20]})])
        .await;
    let text = sync.host().snapshot().to_json_pretty().unwrap();
    assert!(text.contains("\"x\": 10"), "{}", text);
    assert!(!text.contains(".0"), "{}", text);
}

#[tokio::test]
async fn creating_with_a_host_id_as_placeholder_is_rejected() {
    const TWO_NODES: &str = r#"{
  "nodes": [
    {"id": "keep", "type": "text", "text": "old", "x": 0, "y": 0, "width": 250, "height": 60},
    {"id": "other", "type": "text", "text": "o", "x": 300, "y": 0, "width": 250, "height": 60}
  ],
  "edges": []
}"#;
    let sync = adapter_with(TWO_NODES, PersistPolicy::immediate());
    let report = sync
        .apply(&[
            json!({"action": "add_node", "type": "text", "text": "new", "id": "keep"}),
            json!({"action": "update_node", "id": "keep", "text": "edited"}),
            json!({"action": "add_edge", "from": "other", "to": "keep"}),
        ])
        .await;

    assert!(report.success);
    assert!(!report.results[0].success);
    assert!(report.results[0].message.as_deref().unwrap().contains("existing"));
    assert!(report.results[1].success);
    assert!(report.results[2].success);

    let doc = sync.host().snapshot();
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.node("keep").unwrap().text(), Some("edited"));
    assert_eq!(doc.edges[0].to_node.as_str(), "keep");
}
