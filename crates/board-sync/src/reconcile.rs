//! Reconciling a computed document with the host's id space.
//!
//! Nodes and edges that were already in the host document keep their ids.
//! Everything created during the batch gets a fresh host id that collides
//! with nothing in either document, and edges are rewritten through the
//! resulting map so they never point at an internal id.

use std::collections::HashSet;

use indexmap::IndexMap;

use board_core::{generate_id, BoardDocument, EdgeId, NodeId};
use board_ops::EDGE_ID_PREFIX;

use crate::config::SyncConfig;

/// The document to write and the internal-to-host id map of everything
/// that was renamed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub document: BoardDocument,
    pub id_map: IndexMap<String, String>,
}

/// Assigns host ids to new entries of `computed` and fills in the edge
/// fields the host requires.
pub fn reconcile(host: &BoardDocument, computed: BoardDocument, config: &SyncConfig) -> Reconciled {
    let existing_nodes: HashSet<&str> = host.nodes.iter().map(|n| n.id.as_str()).collect();
    let existing_edges: HashSet<&str> = host.edges.iter().map(|e| e.id.as_str()).collect();

    // Every id either document uses is off limits for new ones.
    let mut taken: HashSet<String> = host
        .nodes
        .iter()
        .map(|n| n.id.to_string())
        .chain(host.edges.iter().map(|e| e.id.to_string()))
        .chain(computed.nodes.iter().map(|n| n.id.to_string()))
        .chain(computed.edges.iter().map(|e| e.id.to_string()))
        .collect();

    let mut id_map: IndexMap<String, String> = IndexMap::new();
    let BoardDocument { mut nodes, mut edges } = computed;

    for node in &mut nodes {
        if existing_nodes.contains(node.id.as_str()) {
            continue;
        }
        let fresh = fresh_id(node.node_type().id_prefix(), &mut taken);
        id_map.insert(node.id.to_string(), fresh.clone());
        node.id = NodeId(fresh);
    }

    for edge in &mut edges {
        if !existing_edges.contains(edge.id.as_str()) {
            let fresh = fresh_id(EDGE_ID_PREFIX, &mut taken);
            id_map.insert(edge.id.to_string(), fresh.clone());
            edge.id = EdgeId(fresh);
        }
        if let Some(mapped) = id_map.get(edge.from_node.as_str()) {
            edge.from_node = NodeId(mapped.clone());
        }
        if let Some(mapped) = id_map.get(edge.to_node.as_str()) {
            edge.to_node = NodeId(mapped.clone());
        }
        edge.from_side.get_or_insert(config.default_from_side);
        edge.to_side.get_or_insert(config.default_to_side);
    }

    Reconciled {
        document: BoardDocument { nodes, edges },
        id_map,
    }
}

fn fresh_id(prefix: &str, taken: &mut HashSet<String>) -> String {
    loop {
        let id = generate_id(prefix);
        if taken.insert(id.clone()) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{Edge, Node, NodeKind, Point, Side, Size};

    fn node(id: &str) -> Node {
        Node::new(id.into(), NodeKind::text(id), Point::default(), Size::new(10.0, 10.0))
    }

    #[test]
    fn existing_ids_survive_and_new_ones_are_remapped() {
        let host = BoardDocument::new(vec![node("old")], vec![]);
        let computed = BoardDocument::new(
            vec![node("old"), node("text_node_1_internal")],
            vec![Edge::new("edge_1_internal".into(), "old".into(), "text_node_1_internal".into())],
        );
        let out = reconcile(&host, computed, &SyncConfig::default());

        assert_eq!(out.document.nodes[0].id.as_str(), "old");
        let new_id = &out.id_map["text_node_1_internal"];
        assert_ne!(new_id, "text_node_1_internal");
        assert!(new_id.starts_with("text_node_"));
        assert_eq!(out.document.nodes[1].id.as_str(), new_id);

        let edge = &out.document.edges[0];
        assert_eq!(edge.from_node.as_str(), "old");
        assert_eq!(edge.to_node.as_str(), new_id);
        assert_eq!(edge.id.as_str(), out.id_map["edge_1_internal"]);
    }

    #[test]
    fn edges_get_default_sides_but_keep_explicit_ones() {
        let host = BoardDocument::new(vec![node("a"), node("b")], vec![]);
        let mut styled = Edge::new("e2".into(), "b".into(), "a".into());
        styled.from_side = Some(Side::Top);
        let computed = BoardDocument::new(
            vec![node("a"), node("b")],
            vec![Edge::new("e1".into(), "a".into(), "b".into()), styled],
        );
        let out = reconcile(&host, computed, &SyncConfig::default());
        let sides: Vec<_> = out
            .document
            .edges
            .iter()
            .map(|e| (e.from_side, e.to_side))
            .collect();
        assert_eq!(
            sides,
            vec![
                (Some(Side::Right), Some(Side::Left)),
                (Some(Side::Top), Some(Side::Left))
            ]
        );
    }

    #[test]
    fn unchanged_document_is_a_no_op_apart_from_sides() {
        let host = BoardDocument::new(vec![node("a")], vec![]);
        let out = reconcile(&host, host.clone(), &SyncConfig::default());
        assert!(out.id_map.is_empty());
        assert_eq!(out.document, host);
    }
}
