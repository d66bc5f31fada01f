//! GraphStore: the in-memory mirror of one board document.
//!
//! [`GraphStore`] owns node and edge payloads in insertion-ordered maps and
//! keeps adjacency in a petgraph `StableGraph` whose weights are the ids.
//! Outgoing neighbours of a node are its forward adjacency, incoming
//! neighbours its reverse adjacency, so both are always derived from the
//! same edge set.
//!
//! # Invariants
//!
//! - every edge's endpoints are present in the node map
//! - the petgraph edge set and the edge map describe the same edges
//! - removing a node removes every incident edge
//! - node ids and edge ids are unique
//!
//! All mutations go through `GraphStore` methods. In debug builds each
//! mutation re-checks the invariants.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::{Directed, Direction as PgDirection};
use serde::{Deserialize, Serialize};

use crate::document::BoardDocument;
use crate::edge::{Edge, EdgePatch};
use crate::error::CoreError;
use crate::geometry::{BoundingBox, Direction, Point, RelativePosition, Size, DEFAULT_OFFSET};
use crate::id::{generate_id, EdgeId, NodeId};
use crate::node::{Node, NodeKind, NodePatch, NodeType};

/// Which adjacency to follow from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborDirection {
    Incoming,
    #[default]
    Outgoing,
    Both,
}

/// Conjunctive node filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeQuery {
    /// Exact id; yields at most one node.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    /// Exact color match.
    #[serde(default)]
    pub color: Option<String>,
    /// Case-insensitive substring of a text node's body. Non-text nodes
    /// never match.
    #[serde(default)]
    pub text: Option<String>,
    /// Substring of a file node's path. Non-file nodes never match.
    #[serde(default)]
    pub file: Option<String>,
    /// Keeps nodes whose origin `(x, y)` lies in the box. Only the origin is
    /// tested, not the node rectangle.
    #[serde(default)]
    pub in_bounds: Option<BoundingBox>,
}

/// Options for [`GraphStore::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraverseOptions {
    /// Deepest level to visit; the start node is depth 0. `None` is
    /// unbounded.
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub direction: NeighborDirection,
    #[serde(default)]
    pub include_edges: bool,
}

/// Result of a traversal: nodes in visit order, and (when requested) the
/// edges followed to reach them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Traversal {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

/// The authoritative in-memory graph for one reconciliation cycle.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    graph: StableGraph<NodeId, EdgeId, Directed, u32>,
    node_indices: HashMap<NodeId, NodeIndex<u32>>,
    edge_indices: HashMap<EdgeId, EdgeIndex<u32>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the store from a document in one pass.
    ///
    /// Host documents are not trusted: a node or edge whose id repeats an
    /// earlier one, and an edge whose endpoint is missing, are skipped with
    /// a warning instead of breaking the store's invariants.
    pub fn from_document(doc: BoardDocument) -> Self {
        let mut store = GraphStore::new();
        for node in doc.nodes {
            let id = node.id.clone();
            if store.insert_node_unchecked(node).is_err() {
                tracing::warn!(node = %id, "skipping node with duplicate id");
            }
        }
        for edge in doc.edges {
            let id = edge.id.clone();
            if let Err(err) = store.insert_edge_unchecked(edge) {
                tracing::warn!(edge = %id, error = %err, "skipping edge");
            }
        }

        #[cfg(debug_assertions)]
        store.assert_consistency();

        store
    }

    /// Snapshots the store as a document, preserving insertion order.
    pub fn to_document(&self) -> BoardDocument {
        BoardDocument {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns the nodes matching every set field of `query`.
    pub fn find_nodes(&self, query: &NodeQuery) -> Vec<&Node> {
        if let Some(id) = &query.id {
            return self
                .nodes
                .get(id.as_str())
                .filter(|node| Self::matches(node, query))
                .into_iter()
                .collect();
        }
        self.nodes
            .values()
            .filter(|node| Self::matches(node, query))
            .collect()
    }

    fn matches(node: &Node, query: &NodeQuery) -> bool {
        if let Some(node_type) = query.node_type {
            if node.node_type() != node_type {
                return false;
            }
        }
        if let Some(color) = &query.color {
            if node.color.as_ref() != Some(color) {
                return false;
            }
        }
        if let Some(needle) = &query.text {
            let needle = needle.to_lowercase();
            if !node
                .text()
                .is_some_and(|body| body.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        if let Some(needle) = &query.file {
            match &node.kind {
                NodeKind::File { file, .. } if file.contains(needle.as_str()) => {}
                _ => return false,
            }
        }
        if let Some(bounds) = &query.in_bounds {
            if !bounds.contains(node.origin()) {
                return false;
            }
        }
        true
    }

    /// Returns the distinct neighbour ids of `id` in the given direction,
    /// oldest connection first. Empty if the node does not exist.
    pub fn get_neighbors(&self, id: &str, direction: NeighborDirection) -> Vec<NodeId> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut out: IndexSet<NodeId> = IndexSet::new();
        if matches!(direction, NeighborDirection::Outgoing | NeighborDirection::Both) {
            out.extend(self.directed_neighbors(idx, PgDirection::Outgoing));
        }
        if matches!(direction, NeighborDirection::Incoming | NeighborDirection::Both) {
            out.extend(self.directed_neighbors(idx, PgDirection::Incoming));
        }
        out.into_iter().collect()
    }

    fn directed_neighbors(&self, idx: NodeIndex<u32>, dir: PgDirection) -> Vec<NodeId> {
        // petgraph yields the newest edge first.
        let mut ids: Vec<NodeId> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        ids.reverse();
        ids
    }

    /// Returns every edge with `id` as either endpoint, in document order.
    pub fn get_connected_edges(&self, id: &str) -> Vec<&Edge> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut positions: Vec<usize> = self
            .graph
            .edges_directed(idx, PgDirection::Outgoing)
            .chain(self.graph.edges_directed(idx, PgDirection::Incoming))
            .filter_map(|e| self.edges.get_index_of(e.weight()))
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .filter_map(|i| self.edges.get_index(i).map(|(_, edge)| edge))
            .collect()
    }

    /// Depth-first walk from `start`.
    ///
    /// Each reachable node is yielded once, so cyclic graphs terminate. With
    /// `include_edges`, the edges recorded for a step are those between the
    /// expanding node and the neighbour being entered; edges between nodes
    /// that were already visited are not collected.
    pub fn traverse(&self, start: &str, options: TraverseOptions) -> Traversal {
        let mut result = Traversal::default();
        let mut visited: IndexSet<NodeId> = IndexSet::new();
        if let Some(node) = self.nodes.get(start) {
            self.visit(&node.id, 0, &options, &mut visited, &mut result);
        }
        result
    }

    fn visit(
        &self,
        id: &NodeId,
        depth: usize,
        options: &TraverseOptions,
        visited: &mut IndexSet<NodeId>,
        result: &mut Traversal,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        result.nodes.push(id.clone());
        if options.max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        for neighbor in self.get_neighbors(id.as_str(), options.direction) {
            if visited.contains(&neighbor) {
                continue;
            }
            if options.include_edges {
                result.edges.extend(
                    self.get_connected_edges(id.as_str())
                        .into_iter()
                        .filter(|e| e.touches(neighbor.as_str()))
                        .map(|e| e.id.clone()),
                );
            }
            self.visit(&neighbor, depth + 1, options, visited, result);
        }
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Resolves a requested position to an absolute origin for a node of
    /// `default_size`.
    ///
    /// `Relative` and `Near` fail with [`CoreError::ReferenceNotFound`] when
    /// the anchor is absent. `Center` is the mean of all node origins,
    /// rounded with halves going up (`-2.5` becomes `-2`), and `(0, 0)` on
    /// an empty board. `Near` places the node to the right of the anchor; it
    /// does not avoid collisions.
    pub fn calculate_position(
        &self,
        position: &RelativePosition,
        default_size: Size,
    ) -> Result<Point, CoreError> {
        match position {
            RelativePosition::Absolute { x, y } => Ok(Point::new(*x, *y)),
            RelativePosition::Center => {
                if self.nodes.is_empty() {
                    return Ok(Point::default());
                }
                let n = self.nodes.len() as f64;
                let (sx, sy) = self
                    .nodes
                    .values()
                    .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
                Ok(Point::new(round_half_up(sx / n), round_half_up(sy / n)))
            }
            RelativePosition::Relative {
                node_id,
                direction,
                offset,
            } => {
                let anchor = self.anchor(node_id)?;
                Ok(Self::beside(
                    anchor,
                    *direction,
                    offset.unwrap_or(DEFAULT_OFFSET),
                    default_size,
                ))
            }
            RelativePosition::Near { node_id } => {
                let anchor = self.anchor(node_id)?;
                Ok(Self::beside(anchor, Direction::Right, DEFAULT_OFFSET, default_size))
            }
        }
    }

    fn anchor(&self, id: &str) -> Result<&Node, CoreError> {
        self.nodes.get(id).ok_or_else(|| CoreError::ReferenceNotFound {
            id: NodeId::from(id),
        })
    }

    fn beside(anchor: &Node, direction: Direction, offset: f64, size: Size) -> Point {
        match direction {
            Direction::Right => Point::new(anchor.x + anchor.width + offset, anchor.y),
            Direction::Left => Point::new(anchor.x - (offset + size.width), anchor.y),
            Direction::Below => Point::new(anchor.x, anchor.y + anchor.height + offset),
            Direction::Above => Point::new(anchor.x, anchor.y - size.height - offset),
        }
    }

    /// Returns the box covering the rectangles of the given nodes. Missing
    /// ids are skipped; `None` if no id exists.
    pub fn calculate_bounding_box<S: AsRef<str>>(&self, ids: &[S]) -> Option<BoundingBox> {
        let mut found = ids.iter().filter_map(|id| self.nodes.get(id.as_ref()));
        let first = found.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);
        for node in found {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x + node.width);
            max_y = max_y.max(node.y + node.height);
        }
        Some(BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    // -----------------------------------------------------------------------
    // Id generation
    // -----------------------------------------------------------------------

    /// Generates a node id with `prefix` that is not in use.
    pub fn generate_node_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = generate_id(prefix);
            if !self.nodes.contains_key(id.as_str()) {
                return NodeId(id);
            }
        }
    }

    /// Generates an edge id with `prefix` that is not in use.
    pub fn generate_edge_id(&self, prefix: &str) -> EdgeId {
        loop {
            let id = generate_id(prefix);
            if !self.edges.contains_key(id.as_str()) {
                return EdgeId(id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Node mutations
    // -----------------------------------------------------------------------

    /// Inserts a node. Errors if the id is taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), CoreError> {
        self.insert_node_unchecked(node)?;

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(())
    }

    fn insert_node_unchecked(&mut self, node: Node) -> Result<(), CoreError> {
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::DuplicateNode { id: node.id });
        }
        let idx = self.graph.add_node(node.id.clone());
        self.node_indices.insert(node.id.clone(), idx);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Merges `patch` into the node. Returns `false` if it does not exist.
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                patch.apply(node);
                true
            }
            None => false,
        }
    }

    /// Replaces the text body of a text node. Returns `false` if the node
    /// is missing or not a text node.
    pub fn set_text(&mut self, id: &str, text: String) -> bool {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text { text: body }) => {
                *body = text;
                true
            }
            _ => false,
        }
    }

    /// Removes a node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let idx = self.node_indices.remove(id)?;
        let incident: Vec<EdgeId> = self
            .graph
            .edges_directed(idx, PgDirection::Outgoing)
            .chain(self.graph.edges_directed(idx, PgDirection::Incoming))
            .map(|e| e.weight().clone())
            .collect();
        for edge_id in &incident {
            self.edges.shift_remove(edge_id);
            self.edge_indices.remove(edge_id);
        }
        // StableGraph drops the incident edges along with the node.
        self.graph.remove_node(idx);
        let removed = self.nodes.shift_remove(id);
        tracing::debug!(node = %id, cascaded = incident.len(), "removed node");

        #[cfg(debug_assertions)]
        self.assert_consistency();

        removed
    }

    // -----------------------------------------------------------------------
    // Edge mutations
    // -----------------------------------------------------------------------

    /// Inserts an edge. Both endpoints must exist and the id must be free.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), CoreError> {
        self.insert_edge_unchecked(edge)?;

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(())
    }

    fn insert_edge_unchecked(&mut self, edge: Edge) -> Result<(), CoreError> {
        if self.edges.contains_key(&edge.id) {
            return Err(CoreError::DuplicateEdge { id: edge.id });
        }
        let from = self.endpoint(&edge.from_node)?;
        let to = self.endpoint(&edge.to_node)?;
        let idx = self.graph.add_edge(from, to, edge.id.clone());
        self.edge_indices.insert(edge.id.clone(), idx);
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    fn endpoint(&self, id: &NodeId) -> Result<NodeIndex<u32>, CoreError> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| CoreError::NodeNotFound { id: id.clone() })
    }

    /// Merges `patch` into the edge.
    ///
    /// When an endpoint changes, the edge is detached and re-attached in the
    /// adjacency graph rather than patched in place. Errors if the edge or a
    /// new endpoint is missing; on error nothing changes.
    pub fn update_edge(&mut self, id: &str, patch: &EdgePatch) -> Result<(), CoreError> {
        let edge = self
            .edges
            .get(id)
            .ok_or_else(|| CoreError::EdgeNotFound { id: EdgeId::from(id) })?;

        if patch.changes_endpoints(edge) {
            let mut updated = edge.clone();
            patch.apply(&mut updated);
            let from = self.endpoint(&updated.from_node)?;
            let to = self.endpoint(&updated.to_node)?;
            if let Some(old) = self.edge_indices.remove(id) {
                self.graph.remove_edge(old);
            }
            let idx = self.graph.add_edge(from, to, updated.id.clone());
            self.edge_indices.insert(updated.id.clone(), idx);
            if let Some(slot) = self.edges.get_mut(id) {
                *slot = updated;
            }
        } else if let Some(slot) = self.edges.get_mut(id) {
            patch.apply(slot);
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(())
    }

    /// Removes an edge.
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let idx = self.edge_indices.remove(id)?;
        self.graph.remove_edge(idx);
        let removed = self.edges.shift_remove(id);

        #[cfg(debug_assertions)]
        self.assert_consistency();

        removed
    }

    // -----------------------------------------------------------------------
    // Debug consistency assertion
    // -----------------------------------------------------------------------

    /// Verifies that the maps and the adjacency graph agree.
    ///
    /// Only called in debug builds (via `cfg(debug_assertions)`).
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        assert_eq!(self.nodes.len(), self.graph.node_count());
        assert_eq!(self.edges.len(), self.graph.edge_count());
        assert_eq!(self.nodes.len(), self.node_indices.len());
        assert_eq!(self.edges.len(), self.edge_indices.len());
        for (id, edge) in &self.edges {
            let idx = self.edge_indices[id];
            let (from, to) = self
                .graph
                .edge_endpoints(idx)
                .unwrap_or_else(|| panic!("edge {} has no graph entry", id));
            assert_eq!(self.graph[from], edge.from_node, "edge {} source drift", id);
            assert_eq!(self.graph[to], edge.to_node, "edge {} target drift", id);
            assert!(self.nodes.contains_key(&edge.from_node));
            assert!(self.nodes.contains_key(&edge.to_node));
        }
    }
}

/// Rounds to the nearest integer, halves toward positive infinity, the
/// way the host rounds coordinates.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
