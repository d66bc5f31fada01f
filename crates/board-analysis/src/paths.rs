//! Roots, leaves, paths and level sets.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;

use board_core::{GraphStore, NeighborDirection, NodeId};

/// Nodes with no incoming edge, in document order.
pub fn find_roots(store: &GraphStore) -> Vec<NodeId> {
    store
        .node_ids()
        .filter(|id| {
            store
                .get_neighbors(id.as_str(), NeighborDirection::Incoming)
                .is_empty()
        })
        .cloned()
        .collect()
}

/// Nodes with no outgoing edge, in document order.
pub fn find_leaves(store: &GraphStore) -> Vec<NodeId> {
    store
        .node_ids()
        .filter(|id| {
            store
                .get_neighbors(id.as_str(), NeighborDirection::Outgoing)
                .is_empty()
        })
        .cloned()
        .collect()
}

/// Breadth-first shortest path along outgoing edges.
///
/// Each queue entry carries the full path that reached it, so no parent
/// table is kept. Returns `None` if either node is missing or `to` is
/// unreachable; `Some([from])` when `from == to`.
pub fn shortest_path(store: &GraphStore, from: &str, to: &str) -> Option<Vec<NodeId>> {
    let start = store.get_node(from)?.id.clone();
    if !store.contains_node(to) {
        return None;
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<Vec<NodeId>> = VecDeque::new();
    visited.insert(start.clone());
    queue.push_back(vec![start]);

    while let Some(path) = queue.pop_front() {
        let current = path.last()?;
        if current.as_str() == to {
            return Some(path);
        }
        for next in store.get_neighbors(current.as_str(), NeighborDirection::Outgoing) {
            if visited.insert(next.clone()) {
                let mut extended = path.clone();
                extended.push(next);
                queue.push_back(extended);
            }
        }
    }
    None
}

/// The shortest path from every root to every leaf it reaches.
pub fn root_to_leaf_paths(store: &GraphStore) -> Vec<Vec<NodeId>> {
    let leaves = find_leaves(store);
    let mut paths = Vec::new();
    for root in find_roots(store) {
        for leaf in &leaves {
            if let Some(path) = shortest_path(store, root.as_str(), leaf.as_str()) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Number of nodes on the longest root-to-leaf path; 0 for a board with no
/// roots.
pub fn depth(store: &GraphStore) -> usize {
    root_to_leaf_paths(store)
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

/// Nodes reachable from some root in exactly `level` steps along outgoing
/// edges. A node reachable at several distances appears at each of them.
pub fn nodes_at_level(store: &GraphStore, level: usize) -> Vec<NodeId> {
    let mut found: IndexSet<NodeId> = IndexSet::new();
    let mut seen: HashSet<(NodeId, usize)> = HashSet::new();
    for root in find_roots(store) {
        collect_at_level(store, &root, 0, level, &mut seen, &mut found);
    }
    found.into_iter().collect()
}

fn collect_at_level(
    store: &GraphStore,
    id: &NodeId,
    depth: usize,
    target: usize,
    seen: &mut HashSet<(NodeId, usize)>,
    found: &mut IndexSet<NodeId>,
) {
    if !seen.insert((id.clone(), depth)) {
        return;
    }
    if depth == target {
        found.insert(id.clone());
        return;
    }
    for next in store.get_neighbors(id.as_str(), NeighborDirection::Outgoing) {
        collect_at_level(store, &next, depth + 1, target, seen, found);
    }
}

/// Level sets from the roots down. Each node is listed once, at the
/// smallest level it is reachable at; nodes unreachable from any root are
/// not listed.
pub fn levels(store: &GraphStore) -> Vec<Vec<NodeId>> {
    let mut placed: HashSet<NodeId> = HashSet::new();
    let mut out = Vec::new();
    for level in 0..store.node_count() {
        let fresh: Vec<NodeId> = nodes_at_level(store, level)
            .into_iter()
            .filter(|id| placed.insert(id.clone()))
            .collect();
        if fresh.is_empty() {
            break;
        }
        out.push(fresh);
    }
    out
}
