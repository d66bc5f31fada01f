//! The host document port and an in-memory host.
//!
//! The host owns the board document and renders it; the engine only reads
//! it, computes a new version, and writes it back whole. [`HostDocument`]
//! is the capability the [`SyncAdapter`](crate::adapter::SyncAdapter)
//! depends on. The per-node handle methods have default implementations
//! layered on whole-document read and write, so a host only has to provide
//! the three core calls.

use std::sync::{Mutex, MutexGuard};

use board_core::{BoardDocument, Node};

use crate::error::HostError;

/// An externally owned, mutable board document.
///
/// Methods take `&self`: hosts are shared with background persist tasks and
/// do their own interior locking.
pub trait HostDocument: Send + Sync {
    /// Returns the current document.
    fn read_document(&self) -> Result<BoardDocument, HostError>;

    /// Replaces the whole document.
    fn write_document(&self, doc: &BoardDocument) -> Result<(), HostError>;

    /// Asks the host to flush to durable storage. Best-effort and safe to
    /// call repeatedly.
    fn request_persist(&self) -> Result<(), HostError>;

    /// Returns the live data of one node.
    fn node_data(&self, id: &str) -> Result<Option<Node>, HostError> {
        Ok(self.read_document()?.node(id).cloned())
    }

    /// Replaces the data of the node with the same id. Returns `false` if
    /// there is no such node.
    fn set_node_data(&self, node: &Node) -> Result<bool, HostError> {
        let mut doc = self.read_document()?;
        let Some(slot) = doc.nodes.iter_mut().find(|n| n.id == node.id) else {
            return Ok(false);
        };
        *slot = node.clone();
        self.write_document(&doc)?;
        Ok(true)
    }

    /// Appends a node.
    fn insert_node(&self, node: &Node) -> Result<(), HostError> {
        let mut doc = self.read_document()?;
        doc.nodes.push(node.clone());
        self.write_document(&doc)
    }

    /// Removes a node and the edges attached to it.
    fn remove_node(&self, id: &str) -> Result<Option<Node>, HostError> {
        let mut doc = self.read_document()?;
        let Some(pos) = doc.nodes.iter().position(|n| n.id.as_str() == id) else {
            return Ok(None);
        };
        let removed = doc.nodes.remove(pos);
        doc.edges.retain(|e| !e.touches(id));
        self.write_document(&doc)?;
        Ok(Some(removed))
    }
}

#[derive(Debug, Default)]
struct HostState {
    doc: BoardDocument,
    writes: usize,
    persists: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// A host that keeps the document in memory.
///
/// Counts writes and persist requests, and can be told to fail reads or
/// writes, which makes it the fake of choice in tests.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    pub fn new(doc: BoardDocument) -> Self {
        InMemoryHost {
            state: Mutex::new(HostState {
                doc,
                ..HostState::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HostState>, HostError> {
        self.state
            .lock()
            .map_err(|_| HostError::Unavailable("host state lock poisoned".to_string()))
    }

    /// The current document, or an empty one if the lock is poisoned.
    pub fn snapshot(&self) -> BoardDocument {
        self.lock().map(|s| s.doc.clone()).unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.lock().map(|s| s.writes).unwrap_or_default()
    }

    pub fn persist_count(&self) -> usize {
        self.lock().map(|s| s.persists).unwrap_or_default()
    }

    pub fn fail_reads(&self, fail: bool) {
        if let Ok(mut state) = self.lock() {
            state.fail_reads = fail;
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.lock() {
            state.fail_writes = fail;
        }
    }
}

impl HostDocument for InMemoryHost {
    fn read_document(&self) -> Result<BoardDocument, HostError> {
        let state = self.lock()?;
        if state.fail_reads {
            return Err(HostError::Unavailable("read refused".to_string()));
        }
        Ok(state.doc.clone())
    }

    fn write_document(&self, doc: &BoardDocument) -> Result<(), HostError> {
        let mut state = self.lock()?;
        if state.fail_writes {
            return Err(HostError::Unavailable("write refused".to_string()));
        }
        state.doc = doc.clone();
        state.writes += 1;
        Ok(())
    }

    fn request_persist(&self) -> Result<(), HostError> {
        self.lock()?.persists += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{Edge, NodeKind, Point, Size};

    fn node(id: &str) -> Node {
        Node::new(id.into(), NodeKind::text(id), Point::default(), Size::new(10.0, 10.0))
    }

    #[test]
    fn node_handles_layer_on_whole_document_io() {
        let host = InMemoryHost::default();
        host.insert_node(&node("a")).unwrap();
        host.insert_node(&node("b")).unwrap();
        let mut doc = host.read_document().unwrap();
        doc.edges.push(Edge::new("e".into(), "a".into(), "b".into()));
        host.write_document(&doc).unwrap();

        let mut moved = host.node_data("a").unwrap().unwrap();
        moved.x = 99.0;
        assert!(host.set_node_data(&moved).unwrap());
        assert_eq!(host.node_data("a").unwrap().unwrap().x, 99.0);
        assert!(!host.set_node_data(&node("ghost")).unwrap());

        assert!(host.remove_node("a").unwrap().is_some());
        let doc = host.snapshot();
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.edges.is_empty());
        assert_eq!(host.write_count(), 5);
    }

    #[test]
    fn injected_failures() {
        let host = InMemoryHost::default();
        host.fail_reads(true);
        assert!(host.read_document().is_err());
        host.fail_reads(false);
        host.fail_writes(true);
        assert!(host.write_document(&BoardDocument::default()).is_err());
        assert_eq!(host.write_count(), 0);
        host.request_persist().unwrap();
        assert_eq!(host.persist_count(), 1);
    }
}
