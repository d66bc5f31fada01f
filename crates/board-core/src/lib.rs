//! Board graph engine core.
//!
//! The data model (nodes, edges, the persisted document), geometry helpers,
//! the placeholder [`ReferenceMap`] and the [`GraphStore`] that mirrors one
//! document in memory with forward and reverse adjacency.
//!
//! # Modules
//!
//! - [`id`]: NodeId/EdgeId newtypes and the id generator
//! - [`node`], [`edge`]: node kinds, edges and their partial-update patches
//! - [`document`]: the whole-document shape exchanged with the host
//! - [`geometry`]: points, sizes, bounding boxes, relative positions
//! - [`refs`]: placeholder reference resolution
//! - [`graph`]: GraphStore
//! - [`error`]: CoreError

pub mod document;
pub mod edge;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod node;
pub mod refs;

// Re-export commonly used types
pub use document::BoardDocument;
pub use edge::{Edge, EdgeEnd, EdgePatch, Side};
pub use error::CoreError;
pub use geometry::{BoundingBox, Direction, Point, RelativePosition, Size};
pub use graph::{GraphStore, NeighborDirection, NodeQuery, TraverseOptions, Traversal};
pub use id::{generate_id, EdgeId, NodeId};
pub use node::{BackgroundStyle, Node, NodeKind, NodePatch, NodeType};
pub use refs::ReferenceMap;
