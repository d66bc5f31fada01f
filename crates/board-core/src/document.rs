//! The persisted board document: an ordered node list and an ordered edge
//! list.
//!
//! Order carries no meaning but is preserved so that a document read from
//! the host and written back unchanged diffs clean.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl BoardDocument {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        BoardDocument { nodes, edges }
    }

    /// Parses a document from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Renders the document as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id.as_str() == id)
    }
}
