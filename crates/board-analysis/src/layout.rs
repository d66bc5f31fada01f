//! Level-based hierarchical layout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use board_core::{GraphStore, NodeId, Point};

use crate::paths::levels;

/// Distance between neighbouring slots of the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpacing {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        LayoutSpacing {
            horizontal: 300.0,
            vertical: 200.0,
        }
    }
}

/// Assigns every node a slot: one row per level, nodes left to right in
/// level order.
///
/// Nodes that no root reaches (every node of a pure cycle, for instance)
/// are placed on one extra row below the last level, in document order.
/// The store is not modified; callers apply the positions themselves.
pub fn hierarchical_layout(store: &GraphStore, spacing: LayoutSpacing) -> IndexMap<NodeId, Point> {
    let mut positions: IndexMap<NodeId, Point> = IndexMap::with_capacity(store.node_count());
    let rows = levels(store);
    for (row, ids) in rows.iter().enumerate() {
        for (col, id) in ids.iter().enumerate() {
            positions.insert(id.clone(), slot(row, col, spacing));
        }
    }

    let stragglers: Vec<NodeId> = store
        .node_ids()
        .filter(|id| !positions.contains_key(*id))
        .cloned()
        .collect();
    for (col, id) in stragglers.into_iter().enumerate() {
        positions.insert(id, slot(rows.len(), col, spacing));
    }
    positions
}

fn slot(row: usize, col: usize, spacing: LayoutSpacing) -> Point {
    Point::new(col as f64 * spacing.horizontal, row as f64 * spacing.vertical)
}
