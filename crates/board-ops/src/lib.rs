//! Typed operations over a board graph.
//!
//! [`OperationsService`] wraps one [`GraphStore`](board_core::GraphStore)
//! and a placeholder [`ReferenceMap`](board_core::ReferenceMap). It offers
//! node and edge CRUD, line-based text edits, group building with four
//! layouts, and a two-phase batch that runs every node operation before
//! any edge operation.
//!
//! - [`schema`]: operation requests, outcomes, batch report
//! - [`service`]: the service itself
//! - [`layout`]: child arrangement for built groups
//! - [`text`]: line insertion and search/replace
//! - [`error`]: [`OpsError`] and its [`ErrorKind`] classification

pub mod error;
pub mod layout;
pub mod schema;
pub mod service;
pub mod text;

pub use error::{ErrorKind, OpsError};
pub use schema::{
    BatchReport, BuildGroup, CreateEdge, CreateFileNode, CreateGroupNode, CreateLinkNode,
    CreateTextNode, DeleteEdge, DeleteNode, GroupChild, GroupLayout, InsertText, Operation,
    OperationKind, OperationOutcome, Placement, SearchReplaceText, TextChunk, UpdateEdge,
    UpdateNode,
};
pub use service::{GroupBuild, OperationsService, EDGE_ID_PREFIX};
