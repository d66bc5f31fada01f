//! OperationsService: the typed operation surface over one [`GraphStore`].
//!
//! Every method resolves caller-supplied ids through the placeholder
//! [`ReferenceMap`] before touching the store, so an operation can name a
//! node created earlier in the same batch by its placeholder.
//!
//! Domain failures (missing nodes, bad fields, out-of-range lines) are
//! returned as [`OpsError`]; nothing here panics on caller input. Batch
//! execution turns each failure into a ledger entry and keeps going.

use board_core::{
    BoardDocument, Edge, EdgeId, GraphStore, Node, NodeId, NodeKind, Point, ReferenceMap,
    RelativePosition, Size,
};

use crate::error::OpsError;
use crate::layout::{arrange, Spacing};
use crate::schema::{
    BatchReport, BuildGroup, CreateEdge, CreateFileNode, CreateGroupNode, CreateLinkNode,
    CreateTextNode, InsertText, Operation, OperationKind, OperationOutcome, Placement,
    SearchReplaceText, TextChunk, UpdateEdge, UpdateNode,
};
use crate::text;

/// Id prefix for generated edge ids.
pub const EDGE_ID_PREFIX: &str = "edge";

/// Outcome of [`OperationsService::build_group`]: the group id and one
/// result per child, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBuild {
    pub group: NodeId,
    pub children: Vec<Result<NodeId, OpsError>>,
}

/// Typed create/update/delete/text-edit/batch operations with placeholder
/// bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct OperationsService {
    store: GraphStore,
    refs: ReferenceMap,
}

impl OperationsService {
    pub fn new(store: GraphStore) -> Self {
        OperationsService {
            store,
            refs: ReferenceMap::new(),
        }
    }

    /// Builds a service over a fresh mirror of `doc`.
    pub fn from_document(doc: BoardDocument) -> Self {
        Self::new(GraphStore::from_document(doc))
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn refs(&self) -> &ReferenceMap {
        &self.refs
    }

    pub fn refs_mut(&mut self) -> &mut ReferenceMap {
        &mut self.refs
    }

    pub fn document(&self) -> BoardDocument {
        self.store.to_document()
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Resolves a caller-supplied id or placeholder.
    pub fn resolve(&mut self, key: &str) -> String {
        self.refs.resolve(key)
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    /// Creates a node of any kind.
    ///
    /// The anchor of a relative position is resolved first, then the
    /// position is computed against the final size, an id is generated,
    /// the node is inserted, and finally the placeholder (if any) is bound.
    pub fn create_node(&mut self, kind: NodeKind, placement: &Placement) -> Result<NodeId, OpsError> {
        validate_kind(&kind)?;
        self.check_reference(placement.reference.as_deref())?;
        let node_type = kind.node_type();
        let size = match placement.size {
            Some(size) => validate_size(size)?,
            None => node_type.default_size(),
        };
        let position = self.resolve_position(&placement.position);
        let origin = self.store.calculate_position(&position, size)?;

        let id = self.store.generate_node_id(node_type.id_prefix());
        let mut node = Node::new(id.clone(), kind, origin, size);
        node.color = placement.color.clone();
        self.store.add_node(node)?;

        if let Some(reference) = placement.reference.as_deref() {
            self.refs.insert(reference, id.as_str())?;
        }
        tracing::debug!(node = %id, kind = %node_type, x = origin.x, y = origin.y, "created node");
        Ok(id)
    }

    pub fn create_text_node(&mut self, op: &CreateTextNode) -> Result<NodeId, OpsError> {
        self.create_node(NodeKind::text(op.text.clone()), &op.placement)
    }

    pub fn create_file_node(&mut self, op: &CreateFileNode) -> Result<NodeId, OpsError> {
        let kind = NodeKind::File {
            file: op.file.clone(),
            subpath: op.subpath.clone(),
            portal: op.portal,
        };
        self.create_node(kind, &op.placement)
    }

    pub fn create_link_node(&mut self, op: &CreateLinkNode) -> Result<NodeId, OpsError> {
        self.create_node(NodeKind::link(op.url.clone()), &op.placement)
    }

    pub fn create_group_node(&mut self, op: &CreateGroupNode) -> Result<NodeId, OpsError> {
        self.create_node(NodeKind::group(op.label.clone()), &op.placement)
    }

    /// A new placeholder must be unbound and must not equal a live node or
    /// edge id, so real ids always resolve to themselves.
    fn check_reference(&self, reference: Option<&str>) -> Result<(), OpsError> {
        let Some(reference) = reference else {
            return Ok(());
        };
        if self.refs.contains(reference) {
            return Err(OpsError::validation(
                "ref",
                format!("placeholder '{}' is already bound", reference),
            ));
        }
        if self.store.contains_node(reference) || self.store.contains_edge(reference) {
            return Err(OpsError::validation(
                "ref",
                format!("placeholder '{}' names an existing node or edge", reference),
            ));
        }
        Ok(())
    }

    fn resolve_position(&mut self, position: &RelativePosition) -> RelativePosition {
        match position.anchor() {
            Some(anchor) => {
                let resolved = NodeId(self.refs.resolve(anchor));
                position.with_anchor(&resolved)
            }
            None => position.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Node update / delete
    // -----------------------------------------------------------------------

    /// Applies the present fields of the patch. Kind-specific fields only
    /// touch nodes of that kind.
    pub fn update_node(&mut self, op: &UpdateNode) -> Result<NodeId, OpsError> {
        let id = self.existing_node(&op.id)?;
        for (field, value) in [("width", op.patch.width), ("height", op.patch.height)] {
            if value.is_some_and(|v| !(v.is_finite() && v > 0.0)) {
                return Err(OpsError::validation(field, "must be a positive number"));
            }
        }
        if !self.store.update_node(id.as_str(), &op.patch) {
            return Err(OpsError::NodeNotFound { id: id.0 });
        }
        tracing::debug!(node = %id, "updated node");
        Ok(id)
    }

    /// Removes the node and its incident edges.
    pub fn delete_node(&mut self, id: &str) -> Result<NodeId, OpsError> {
        let resolved = self.resolve(id);
        match self.store.remove_node(&resolved) {
            Some(node) => Ok(node.id),
            None => Err(OpsError::NodeNotFound { id: resolved }),
        }
    }

    fn existing_node(&mut self, key: &str) -> Result<NodeId, OpsError> {
        let resolved = self.resolve(key);
        match self.store.get_node(&resolved) {
            Some(node) => Ok(node.id.clone()),
            None => Err(OpsError::NodeNotFound { id: resolved }),
        }
    }

    // -----------------------------------------------------------------------
    // Text edits
    // -----------------------------------------------------------------------

    /// Inserts a line so that it becomes line `start_line`.
    pub fn insert_text(&mut self, op: &InsertText) -> Result<NodeId, OpsError> {
        self.edit_text(&op.id, |body| text::insert_line(body, op.start_line, &op.content))
    }

    /// Replaces every match, optionally only within a line range.
    pub fn search_replace_text(&mut self, op: &SearchReplaceText) -> Result<NodeId, OpsError> {
        let pattern = text::compile_pattern(&op.search, op.is_regex, op.case_sensitive)?;
        self.edit_text(&op.id, |body| {
            text::rewrite_lines(body, op.start_line, op.end_line, |slice| {
                text::replace_all(slice, &pattern, &op.replace, op.is_regex)
            })
        })
    }

    pub fn append_text(&mut self, op: &TextChunk) -> Result<NodeId, OpsError> {
        self.edit_text(&op.id, |body| Ok(format!("{}{}", body, op.content)))
    }

    pub fn prepend_text(&mut self, op: &TextChunk) -> Result<NodeId, OpsError> {
        self.edit_text(&op.id, |body| Ok(format!("{}{}", op.content, body)))
    }

    fn edit_text(
        &mut self,
        key: &str,
        edit: impl FnOnce(&str) -> Result<String, OpsError>,
    ) -> Result<NodeId, OpsError> {
        let id = self.existing_node(key)?;
        let updated = {
            let node = self
                .store
                .get_node(id.as_str())
                .ok_or_else(|| OpsError::NodeNotFound { id: id.to_string() })?;
            let body = node.text().ok_or_else(|| OpsError::NotATextNode {
                id: id.clone(),
                actual: node.node_type(),
            })?;
            edit(body)?
        };
        self.store.set_text(id.as_str(), updated);
        tracing::debug!(node = %id, "edited text");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Creates a group sized to its children, then each child inside it.
    ///
    /// Fails only if the group itself cannot be created. Child failures are
    /// reported individually in [`GroupBuild::children`].
    pub fn build_group(&mut self, op: &BuildGroup) -> Result<GroupBuild, OpsError> {
        let sizes: Vec<Size> = op.children.iter().map(|c| c.size_or_default()).collect();
        let manual: Vec<(Option<f64>, Option<f64>)> =
            op.children.iter().map(|c| (c.x, c.y)).collect();
        let spacing = Spacing {
            padding: op.padding,
            spacing: op.spacing,
            grid_columns: op.grid_columns,
        };
        let arrangement = arrange(op.layout, &sizes, &manual, spacing);

        let group_size = match &arrangement {
            Some(a) => Some(a.size),
            None => op.size,
        };
        let placement = Placement {
            reference: op.reference.clone(),
            position: op.position.clone(),
            size: group_size,
            color: op.color.clone(),
        };
        let group = self.create_node(NodeKind::group(op.label.clone()), &placement)?;
        let origin = self
            .store
            .get_node(group.as_str())
            .map(Node::origin)
            .unwrap_or_default();

        let offsets = arrangement.map(|a| a.offsets).unwrap_or_default();
        let children = op
            .children
            .iter()
            .zip(offsets)
            .zip(sizes)
            .map(|((child, offset), size)| {
                let placement = Placement {
                    reference: child.reference.clone(),
                    position: absolute(origin.offset_by(offset)),
                    size: Some(size),
                    color: child.color.clone(),
                };
                self.create_node(child.kind.clone(), &placement)
            })
            .collect::<Vec<_>>();

        let failed = children.iter().filter(|c| c.is_err()).count();
        tracing::debug!(
            group = %group,
            layout = ?op.layout,
            children = children.len(),
            failed,
            "built group"
        );
        Ok(GroupBuild { group, children })
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Creates an edge between two existing nodes (ids or placeholders).
    pub fn create_edge(&mut self, op: &CreateEdge) -> Result<EdgeId, OpsError> {
        self.check_reference(op.reference.as_deref())?;
        let from = self.endpoint(&op.from_node, true)?;
        let to = self.endpoint(&op.to_node, false)?;

        let id = self.store.generate_edge_id(EDGE_ID_PREFIX);
        let edge = Edge {
            id: id.clone(),
            from_node: from,
            from_side: op.from_side,
            from_end: op.from_end,
            to_node: to,
            to_side: op.to_side,
            to_end: op.to_end,
            color: op.color.clone(),
            label: op.label.clone(),
        };
        self.store.add_edge(edge)?;
        if let Some(reference) = op.reference.as_deref() {
            self.refs.insert(reference, id.as_str())?;
        }
        tracing::debug!(edge = %id, "created edge");
        Ok(id)
    }

    /// Patches an edge. New endpoints may be placeholders.
    pub fn update_edge(&mut self, op: &UpdateEdge) -> Result<EdgeId, OpsError> {
        let id = self.resolve(&op.id);
        if !self.store.contains_edge(&id) {
            return Err(OpsError::EdgeNotFound { id });
        }
        let mut patch = op.patch.clone();
        if let Some(from) = &op.patch.from_node {
            patch.from_node = Some(self.endpoint(from.as_str(), true)?);
        }
        if let Some(to) = &op.patch.to_node {
            patch.to_node = Some(self.endpoint(to.as_str(), false)?);
        }
        self.store.update_edge(&id, &patch)?;
        tracing::debug!(edge = %id, "updated edge");
        Ok(EdgeId(id))
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<EdgeId, OpsError> {
        let resolved = self.resolve(id);
        match self.store.remove_edge(&resolved) {
            Some(edge) => Ok(edge.id),
            None => Err(OpsError::EdgeNotFound { id: resolved }),
        }
    }

    fn endpoint(&mut self, key: &str, source: bool) -> Result<NodeId, OpsError> {
        let resolved = self.resolve(key);
        match self.store.get_node(&resolved) {
            Some(node) => Ok(node.id.clone()),
            None if source => Err(OpsError::SourceNotFound { id: resolved }),
            None => Err(OpsError::TargetNotFound { id: resolved }),
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch and batches
    // -----------------------------------------------------------------------

    /// Executes one operation and reports it. A group build reports the
    /// group followed by one entry per child; everything else reports once.
    pub fn execute(&mut self, index: usize, operation: &Operation) -> Vec<OperationOutcome> {
        let kind = operation.kind();
        let reference = operation.reference();
        let result = match operation {
            Operation::CreateTextNode(op) => self.create_text_node(op).map(|id| id.0),
            Operation::CreateFileNode(op) => self.create_file_node(op).map(|id| id.0),
            Operation::CreateLinkNode(op) => self.create_link_node(op).map(|id| id.0),
            Operation::CreateGroupNode(op) => self.create_group_node(op).map(|id| id.0),
            Operation::UpdateNode(op) => self.update_node(op).map(|id| id.0),
            Operation::DeleteNode(op) => self.delete_node(&op.id).map(|id| id.0),
            Operation::InsertText(op) => self.insert_text(op).map(|id| id.0),
            Operation::SearchReplaceText(op) => self.search_replace_text(op).map(|id| id.0),
            Operation::AppendText(op) => self.append_text(op).map(|id| id.0),
            Operation::PrependText(op) => self.prepend_text(op).map(|id| id.0),
            Operation::BuildGroup(op) => return self.execute_build_group(index, op),
            Operation::CreateEdge(op) => self.create_edge(op).map(|id| id.0),
            Operation::UpdateEdge(op) => self.update_edge(op).map(|id| id.0),
            Operation::DeleteEdge(op) => self.delete_edge(&op.id).map(|id| id.0),
        };

        let outcome = match result {
            Ok(id) => OperationOutcome::succeeded(index, kind, id),
            Err(err) => {
                tracing::debug!(index, operation = ?kind, error = %err, "operation failed");
                OperationOutcome::failed(index, kind, &err).with_id(target_id(operation))
            }
        };
        vec![outcome.with_reference(reference)]
    }

    fn execute_build_group(&mut self, index: usize, op: &BuildGroup) -> Vec<OperationOutcome> {
        let reference = op.reference.as_deref();
        match self.build_group(op) {
            Ok(build) => {
                let mut out = Vec::with_capacity(build.children.len() + 1);
                out.push(
                    OperationOutcome::succeeded(index, OperationKind::BuildGroup, build.group.0)
                        .with_reference(reference),
                );
                for (child, result) in op.children.iter().zip(build.children) {
                    let outcome = match result {
                        Ok(id) => OperationOutcome::succeeded(index, OperationKind::CreateNode, id.0),
                        Err(err) => OperationOutcome::failed(index, OperationKind::CreateNode, &err),
                    };
                    out.push(outcome.with_reference(child.reference.as_deref()));
                }
                out
            }
            Err(err) => vec![
                OperationOutcome::failed(index, OperationKind::BuildGroup, &err)
                    .with_reference(reference),
            ],
        }
    }

    /// Runs a batch in two phases: every node-class operation in submitted
    /// order, then every edge-class operation in submitted order.
    ///
    /// Edges can therefore name nodes created anywhere in the same batch by
    /// placeholder. A failing operation is recorded and never stops the
    /// batch.
    pub fn execute_batch(&mut self, operations: &[Operation]) -> BatchReport {
        self.execute_indexed(operations.iter().enumerate())
    }

    /// [`execute_batch`](Self::execute_batch) over operations that carry
    /// their own ledger index, for callers that dropped some requests
    /// before execution.
    pub fn execute_indexed<'a>(
        &mut self,
        operations: impl IntoIterator<Item = (usize, &'a Operation)>,
    ) -> BatchReport {
        let (edge_ops, node_ops): (Vec<_>, Vec<_>) = operations
            .into_iter()
            .partition(|(_, op)| op.is_edge_operation());
        let submitted = edge_ops.len() + node_ops.len();

        let nodes: Vec<OperationOutcome> = node_ops
            .into_iter()
            .flat_map(|(i, op)| self.execute(i, op))
            .collect();
        let edges: Vec<OperationOutcome> = edge_ops
            .into_iter()
            .flat_map(|(i, op)| self.execute(i, op))
            .collect();

        let report = BatchReport {
            nodes,
            edges,
            document: self.store.to_document(),
        };
        tracing::info!(
            operations = submitted,
            node_results = report.nodes.len(),
            edge_results = report.edges.len(),
            failed = report.failure_count(),
            "executed batch"
        );
        report
    }
}

/// The id an operation targets as submitted, for failure reports.
fn target_id(operation: &Operation) -> Option<&str> {
    match operation {
        Operation::UpdateNode(op) => Some(&op.id),
        Operation::DeleteNode(op) => Some(&op.id),
        Operation::InsertText(op) => Some(&op.id),
        Operation::SearchReplaceText(op) => Some(&op.id),
        Operation::AppendText(op) | Operation::PrependText(op) => Some(&op.id),
        Operation::UpdateEdge(op) => Some(&op.id),
        Operation::DeleteEdge(op) => Some(&op.id),
        _ => None,
    }
}

fn absolute(point: Point) -> RelativePosition {
    RelativePosition::Absolute {
        x: point.x,
        y: point.y,
    }
}

fn validate_size(size: Size) -> Result<Size, OpsError> {
    if !(size.width.is_finite() && size.width > 0.0) {
        return Err(OpsError::validation("width", "must be a positive number"));
    }
    if !(size.height.is_finite() && size.height > 0.0) {
        return Err(OpsError::validation("height", "must be a positive number"));
    }
    Ok(size)
}

fn validate_kind(kind: &NodeKind) -> Result<(), OpsError> {
    match kind {
        NodeKind::File { file, .. } if file.trim().is_empty() => {
            Err(OpsError::validation("file", "path must not be empty"))
        }
        NodeKind::Link { url } if url.trim().is_empty() => {
            Err(OpsError::validation("url", "must not be empty"))
        }
        _ => Ok(()),
    }
}
