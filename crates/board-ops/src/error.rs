//! Operation-level errors and their coarse classification.
//!
//! [`OpsError`] is what every `OperationsService` method returns on failure.
//! Each variant maps to one [`ErrorKind`], which is what batch callers see
//! in the per-operation ledger.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use board_core::{CoreError, NodeId, NodeType};

/// Coarse failure class reported alongside each failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A node, edge or anchor is absent.
    NotFound,
    /// A field is missing or malformed.
    Validation,
    /// A line number lies outside the text.
    Range,
    /// The host document could not be read or written.
    Sync,
}

/// Errors produced by `OperationsService`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpsError {
    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("edge not found: {id}")]
    EdgeNotFound { id: String },

    /// The `from` endpoint of an edge does not resolve to a node.
    #[error("source node not found: {id}")]
    SourceNotFound { id: String },

    /// The `to` endpoint of an edge does not resolve to a node.
    #[error("target node not found: {id}")]
    TargetNotFound { id: String },

    /// The anchor of a relative or near position does not exist.
    #[error("reference node not found: {id}")]
    AnchorNotFound { id: String },

    #[error("node {id} is a {actual} node, not a text node")]
    NotATextNode { id: NodeId, actual: NodeType },

    #[error("line {line} is out of range (valid: {min}..={max})")]
    LineOutOfRange { line: usize, min: usize, max: usize },

    #[error("invalid search pattern: {reason}")]
    InvalidPattern { reason: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl OpsError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        OpsError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::NodeNotFound { .. }
            | OpsError::EdgeNotFound { .. }
            | OpsError::SourceNotFound { .. }
            | OpsError::TargetNotFound { .. }
            | OpsError::AnchorNotFound { .. } => ErrorKind::NotFound,
            OpsError::LineOutOfRange { .. } => ErrorKind::Range,
            OpsError::NotATextNode { .. }
            | OpsError::InvalidPattern { .. }
            | OpsError::Validation { .. } => ErrorKind::Validation,
        }
    }
}

impl From<CoreError> for OpsError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NodeNotFound { id } => OpsError::NodeNotFound { id: id.0 },
            CoreError::EdgeNotFound { id } => OpsError::EdgeNotFound { id: id.0 },
            CoreError::ReferenceNotFound { id } => OpsError::AnchorNotFound { id: id.0 },
            CoreError::DuplicateNode { .. } | CoreError::DuplicateEdge { .. } => {
                OpsError::validation("id", err.to_string())
            }
            CoreError::ReferenceCycle { .. } => OpsError::validation("ref", err.to_string()),
        }
    }
}
