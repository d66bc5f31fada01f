//! Directed edges between board nodes.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};

/// A directed connection between two nodes with optional styling.
///
/// `from_node` and `to_node` must name existing nodes; the store rejects
/// edges whose endpoints are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub from_node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_end: Option<EdgeEnd>,
    pub to_node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_end: Option<EdgeEnd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The side of a node an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "top" => Some(Side::Top),
            "right" => Some(Side::Right),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            _ => None,
        }
    }
}

/// Decoration drawn at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEnd {
    None,
    Arrow,
}

impl EdgeEnd {
    pub fn parse(s: &str) -> Option<EdgeEnd> {
        match s {
            "none" => Some(EdgeEnd::None),
            "arrow" => Some(EdgeEnd::Arrow),
            _ => None,
        }
    }
}

impl Edge {
    /// Creates an unstyled edge.
    pub fn new(id: EdgeId, from_node: NodeId, to_node: NodeId) -> Self {
        Edge {
            id,
            from_node,
            from_side: None,
            from_end: None,
            to_node,
            to_side: None,
            to_end: None,
            color: None,
            label: None,
        }
    }

    /// Returns `true` if `node` is either endpoint.
    pub fn touches(&self, node: &str) -> bool {
        self.from_node.as_str() == node || self.to_node.as_str() == node
    }
}

/// A partial edge update. Changing `from_node`/`to_node` re-attaches the
/// edge; the store re-derives adjacency for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_end: Option<EdgeEnd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_end: Option<EdgeEnd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EdgePatch {
    /// Returns `true` if applying this patch moves either endpoint of `edge`.
    pub fn changes_endpoints(&self, edge: &Edge) -> bool {
        self.from_node.as_ref().is_some_and(|f| *f != edge.from_node)
            || self.to_node.as_ref().is_some_and(|t| *t != edge.to_node)
    }

    /// Merges the present fields into `edge`.
    pub fn apply(&self, edge: &mut Edge) {
        if let Some(from) = &self.from_node {
            edge.from_node = from.clone();
        }
        if let Some(to) = &self.to_node {
            edge.to_node = to.clone();
        }
        if let Some(side) = self.from_side {
            edge.from_side = Some(side);
        }
        if let Some(side) = self.to_side {
            edge.to_side = Some(side);
        }
        if let Some(end) = self.from_end {
            edge.from_end = Some(end);
        }
        if let Some(end) = self.to_end {
            edge.to_end = Some(end);
        }
        if let Some(color) = &self.color {
            edge.color = Some(color.clone());
        }
        if let Some(label) = &self.label {
            edge.label = Some(label.clone());
        }
    }
}
