//! Subcommand implementations. Each returns the JSON printed on stdout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use board_analysis::{
    connected_components, depth, find_leaves, find_roots, has_cycle, hierarchical_layout, levels,
    LayoutSpacing,
};
use board_core::{GraphStore, NeighborDirection, NodeQuery, NodeType, TraverseOptions};
use board_sync::{HostDocument, PersistPolicy, SyncAdapter, SyncConfig, SyncReport};

use crate::file_host::FileHost;

/// Applies the requests in `ops_path` to the board file.
///
/// `persist_delays` overrides the follow-up persist schedule from the
/// environment. Returns once the follow-up persists have had time to run.
pub async fn apply(board: &Path, ops_path: &Path, persist_delays: Option<&str>) -> Result<SyncReport> {
    let mut config = SyncConfig::from_env()?;
    if let Some(delays) = persist_delays {
        config = config.with_persist(PersistPolicy::parse(delays)?);
    }
    let wait: Duration = config.persist.follow_up_delays.iter().sum();

    let text = std::fs::read_to_string(ops_path)
        .with_context(|| format!("failed to read operations file '{}'", ops_path.display()))?;
    let payload: Value = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not valid JSON", ops_path.display()))?;

    let adapter = SyncAdapter::new(Arc::new(FileHost::new(board)), config);
    let report = adapter.apply_value(&payload).await;

    if report.success && !wait.is_zero() {
        tokio::time::sleep(wait + Duration::from_millis(50)).await;
    }
    Ok(report)
}

/// Filters for the `query` subcommand.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub node_type: Option<String>,
    pub text: Option<String>,
    pub color: Option<String>,
    pub file: Option<String>,
}

/// Lists the nodes matching every given filter.
pub fn query(board: &Path, args: &QueryArgs) -> Result<Value> {
    let store = load(board)?;
    let node_type = match args.node_type.as_deref() {
        Some(name) => Some(
            NodeType::parse(name)
                .with_context(|| format!("unknown node type '{}'", name))?,
        ),
        None => None,
    };
    let query = NodeQuery {
        node_type,
        text: args.text.clone(),
        color: args.color.clone(),
        file: args.file.clone(),
        ..NodeQuery::default()
    };
    Ok(serde_json::to_value(store.find_nodes(&query))?)
}

/// Walks the board from `start`.
pub fn traverse(
    board: &Path,
    start: &str,
    direction: NeighborDirection,
    max_depth: Option<usize>,
) -> Result<Value> {
    let store = load(board)?;
    anyhow::ensure!(store.contains_node(start), "node not found: {}", start);
    let walk = store.traverse(
        start,
        TraverseOptions {
            max_depth,
            direction,
            include_edges: true,
        },
    );
    Ok(serde_json::to_value(walk)?)
}

/// Structural summary of the board; with `layout`, also a hierarchical
/// placement for every node.
pub fn analyze(board: &Path, layout: bool) -> Result<Value> {
    let store = load(board)?;
    let mut summary = json!({
        "nodes": store.node_count(),
        "edges": store.edge_count(),
        "roots": find_roots(&store),
        "leaves": find_leaves(&store),
        "hasCycle": has_cycle(&store),
        "depth": depth(&store),
        "levels": levels(&store),
        "components": connected_components(&store),
    });
    if layout {
        summary["layout"] = serde_json::to_value(hierarchical_layout(&store, LayoutSpacing::default()))?;
    }
    Ok(summary)
}

fn load(board: &Path) -> Result<GraphStore> {
    let doc = FileHost::new(board)
        .read_document()
        .with_context(|| format!("failed to read board '{}'", board.display()))?;
    Ok(GraphStore::from_document(doc))
}
