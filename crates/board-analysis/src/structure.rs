//! Cycle detection and connected components.

use std::collections::{HashMap, HashSet};

use board_core::{GraphStore, NeighborDirection, NodeId, TraverseOptions};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Gray,
    Black,
}

/// Returns `true` if following outgoing edges can lead back to a node
/// already on the current path.
///
/// Classic three-colour depth-first search: unmarked nodes are white, nodes
/// on the recursion stack are gray, finished nodes are black.
pub fn has_cycle(store: &GraphStore) -> bool {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut stack: HashSet<NodeId> = HashSet::new();
    store
        .node_ids()
        .any(|id| !marks.contains_key(id) && visit(store, id, &mut marks, &mut stack))
}

fn visit(
    store: &GraphStore,
    id: &NodeId,
    marks: &mut HashMap<NodeId, Mark>,
    stack: &mut HashSet<NodeId>,
) -> bool {
    marks.insert(id.clone(), Mark::Gray);
    stack.insert(id.clone());

    for next in store.get_neighbors(id.as_str(), NeighborDirection::Outgoing) {
        if stack.contains(&next) {
            return true;
        }
        if marks.get(&next) != Some(&Mark::Black) && visit(store, &next, marks, stack) {
            return true;
        }
    }

    stack.remove(id);
    marks.insert(id.clone(), Mark::Black);
    false
}

/// Weakly connected components, each in traversal order. Components are
/// ordered by their first node in the document.
pub fn connected_components(store: &GraphStore) -> Vec<Vec<NodeId>> {
    let options = TraverseOptions {
        direction: NeighborDirection::Both,
        ..TraverseOptions::default()
    };
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut components = Vec::new();
    for id in store.node_ids() {
        if seen.contains(id) {
            continue;
        }
        let component = store.traverse(id.as_str(), options).nodes;
        seen.extend(component.iter().cloned());
        components.push(component);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{Edge, Node, NodeKind, Point, Size};

    fn build(nodes: &[&str], edges: &[(&str, &str)]) -> GraphStore {
        let mut store = GraphStore::new();
        for id in nodes {
            store
                .add_node(Node::new(
                    (*id).into(),
                    NodeKind::text(*id),
                    Point::default(),
                    Size::new(100.0, 40.0),
                ))
                .unwrap();
        }
        for (i, (from, to)) in edges.iter().enumerate() {
            store
                .add_edge(Edge::new(format!("e{}", i).into(), (*from).into(), (*to).into()))
                .unwrap();
        }
        store
    }

    #[test]
    fn detects_three_node_cycle() {
        let store = build(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!(has_cycle(&store));
    }

    #[test]
    fn diamond_is_acyclic() {
        let store = build(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        assert!(!has_cycle(&store));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let store = build(&["a"], &[("a", "a")]);
        assert!(has_cycle(&store));
    }

    #[test]
    fn components_ignore_direction() {
        let store = build(
            &["a", "b", "c", "d", "e"],
            &[("b", "a"), ("c", "b"), ("d", "e")],
        );
        let comps = connected_components(&store);
        assert_eq!(comps.len(), 2);
        let first: Vec<&str> = comps[0].iter().map(NodeId::as_str).collect();
        assert_eq!(first, ["a", "b", "c"]);
        assert_eq!(comps[1].len(), 2);
    }

    #[test]
    fn empty_board_has_no_components() {
        assert!(connected_components(&GraphStore::new()).is_empty());
        assert!(!has_cycle(&GraphStore::new()));
    }
}
