//! Core error types for board-core.
//!
//! Uses `thiserror` for structured, matchable variants covering the failure
//! modes of the graph store and the reference map.

use thiserror::Error;

use crate::id::{EdgeId, NodeId};

/// Errors produced by the board-core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A node id was not found in the store.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// An edge id was not found in the store.
    #[error("edge not found: {id}")]
    EdgeNotFound { id: EdgeId },

    /// The anchor of a relative or near position does not exist.
    #[error("reference node not found: {id}")]
    ReferenceNotFound { id: NodeId },

    /// A node with this id is already present.
    #[error("duplicate node id: {id}")]
    DuplicateNode { id: NodeId },

    /// An edge with this id is already present.
    #[error("duplicate edge id: {id}")]
    DuplicateEdge { id: EdgeId },

    /// Remapping a placeholder would make its resolution chain loop.
    #[error("reference cycle: remapping '{reference}' to '{target}' would loop")]
    ReferenceCycle { reference: String, target: String },
}
