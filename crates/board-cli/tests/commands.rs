//! The boardctl subcommands against board files in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use board_cli::commands::{self, QueryArgs};
use board_core::{BoardDocument, NeighborDirection};

fn write_ops(dir: &TempDir, ops: serde_json::Value) -> PathBuf {
    let path = dir.path().join("ops.json");
    fs::write(&path, ops.to_string()).unwrap();
    path
}

fn read_board(path: &Path) -> BoardDocument {
    BoardDocument::from_json(&fs::read_to_string(path).unwrap()).unwrap()
}

async fn seeded_board(dir: &TempDir) -> PathBuf {
    let board = dir.path().join("board.canvas");
    let ops = write_ops(
        dir,
        json!([
            {"action": "add_node", "type": "text", "text": "Start here", "ref": "a", "x": 0, "y": 0},
            {"action": "add_node", "type": "text", "text": "Next", "ref": "b", "relativeTo": "a"},
            {"action": "add_node", "type": "file", "file": "notes/plan.md", "ref": "c", "near": "b"},
            {"action": "add_edge", "from": "a", "to": "b"},
            {"action": "add_edge", "from": "b", "to": "c"},
        ]),
    );
    let report = commands::apply(&board, &ops, Some("")).await.unwrap();
    assert!(report.success, "{:?}", report);
    assert_eq!(report.failure_count(), 0);
    board
}

#[tokio::test]
async fn apply_creates_the_board_file() {
    let dir = tempfile::tempdir().unwrap();
    let board = seeded_board(&dir).await;

    let doc = read_board(&board);
    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.edges.len(), 2);
    for edge in &doc.edges {
        assert!(doc.node(edge.from_node.as_str()).is_some());
        assert!(doc.node(edge.to_node.as_str()).is_some());
    }
}

#[tokio::test]
async fn apply_reports_failed_operations_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let board = dir.path().join("board.canvas");
    let ops = write_ops(
        &dir,
        json!([
            {"action": "add_node", "type": "text", "text": "only"},
            {"action": "add_edge", "from": "nowhere", "to": "nothing"},
        ]),
    );
    let report = commands::apply(&board, &ops, Some("")).await.unwrap();
    assert!(report.success);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(read_board(&board).nodes.len(), 1);
}

#[tokio::test]
async fn apply_rejects_a_malformed_operations_file() {
    let dir = tempfile::tempdir().unwrap();
    let ops = dir.path().join("ops.json");
    fs::write(&ops, "[{").unwrap();
    let err = commands::apply(&dir.path().join("board.canvas"), &ops, Some(""))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("not valid JSON"));
}

#[tokio::test]
async fn query_filters_by_type_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let board = seeded_board(&dir).await;

    let files = commands::query(
        &board,
        &QueryArgs {
            node_type: Some("file".into()),
            ..QueryArgs::default()
        },
    )
    .unwrap();
    assert_eq!(files.as_array().unwrap().len(), 1);
    assert_eq!(files[0]["file"], "notes/plan.md");

    let text = commands::query(
        &board,
        &QueryArgs {
            text: Some("start".into()),
            ..QueryArgs::default()
        },
    )
    .unwrap();
    assert_eq!(text.as_array().unwrap().len(), 1);

    let bad = commands::query(
        &board,
        &QueryArgs {
            node_type: Some("sticky".into()),
            ..QueryArgs::default()
        },
    );
    assert!(bad.is_err());
}

#[tokio::test]
async fn traverse_and_analyze_describe_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let board = seeded_board(&dir).await;
    let doc = read_board(&board);
    let start = doc.nodes[0].id.to_string();

    let walk = commands::traverse(&board, &start, NeighborDirection::Outgoing, None).unwrap();
    assert_eq!(walk["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(walk["edges"].as_array().unwrap().len(), 2);

    let shallow = commands::traverse(&board, &start, NeighborDirection::Outgoing, Some(1)).unwrap();
    assert_eq!(shallow["nodes"].as_array().unwrap().len(), 2);

    assert!(commands::traverse(&board, "missing", NeighborDirection::Both, None).is_err());

    let summary = commands::analyze(&board, true).unwrap();
    assert_eq!(summary["nodes"], 3);
    assert_eq!(summary["roots"], json!([start]));
    assert_eq!(summary["hasCycle"], false);
    assert_eq!(summary["depth"], 3);
    assert_eq!(summary["components"].as_array().unwrap().len(), 1);
    assert_eq!(summary["layout"].as_object().unwrap().len(), 3);
}
