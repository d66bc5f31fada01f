//! Request and result types for the operations surface.
//!
//! An [`Operation`] is one tagged request (`"op": "create_text_node"`, ...).
//! Every executed operation yields one or more [`OperationOutcome`]s; a
//! batch collects them into a [`BatchReport`].

use serde::{Deserialize, Serialize};

use board_core::{
    BoardDocument, EdgeEnd, EdgePatch, NodeKind, NodePatch, RelativePosition, Side, Size,
};

use crate::error::{ErrorKind, OpsError};

// ---------------------------------------------------------------------------
// Node creation
// ---------------------------------------------------------------------------

/// Where and how large to create a node, plus the placeholder to bind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Placeholder name bound to the generated id on success.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub position: RelativePosition,
    /// Overrides the kind's default size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTextNode {
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFileNode {
    #[serde(flatten)]
    pub placement: Placement,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLinkNode {
    #[serde(flatten)]
    pub placement: Placement,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupNode {
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Node update / delete / text edits
// ---------------------------------------------------------------------------

/// Partial update of a node. `id` may be a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNode {
    pub id: String,
    #[serde(flatten)]
    pub patch: NodePatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertText {
    pub id: String,
    /// 1-based line the content will occupy.
    pub start_line: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReplaceText {
    pub id: String,
    pub search: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    /// Restricts the rewrite to `start_line..=end_line` (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

fn default_true() -> bool {
    true
}

/// Payload for both append and prepend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// How children are arranged inside a built group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLayout {
    #[default]
    Vertical,
    Horizontal,
    Grid,
    Manual,
}

/// One child of a [`BuildGroup`]. The child kind is given inline with its
/// `"type"` tag, as in a document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChild {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Offset inside the group; only read by the manual layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl GroupChild {
    pub fn size_or_default(&self) -> Size {
        self.size
            .unwrap_or_else(|| self.kind.node_type().default_size())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildGroup {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub position: RelativePosition,
    /// Group size when there are no children. Ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub layout: GroupLayout,
    #[serde(default = "default_gap")]
    pub padding: f64,
    #[serde(default = "default_gap")]
    pub spacing: f64,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,
    #[serde(default)]
    pub children: Vec<GroupChild>,
}

fn default_gap() -> f64 {
    20.0
}

fn default_grid_columns() -> usize {
    2
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Creates an edge. Endpoints may be placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdge {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub from_node: String,
    pub to_node: String,
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

impl CreateEdge {
    pub fn new(from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        CreateEdge {
            reference: None,
            from_node: from_node.into(),
            to_node: to_node.into(),
            from_side: None,
            to_side: None,
            from_end: None,
            to_end: None,
            color: None,
            label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEdge {
    pub id: String,
    #[serde(flatten)]
    pub patch: EdgePatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteEdge {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Operation envelope
// ---------------------------------------------------------------------------

/// One request to the operations service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateTextNode(CreateTextNode),
    CreateFileNode(CreateFileNode),
    CreateLinkNode(CreateLinkNode),
    CreateGroupNode(CreateGroupNode),
    UpdateNode(UpdateNode),
    DeleteNode(DeleteNode),
    InsertText(InsertText),
    SearchReplaceText(SearchReplaceText),
    AppendText(TextChunk),
    PrependText(TextChunk),
    BuildGroup(BuildGroup),
    CreateEdge(CreateEdge),
    UpdateEdge(UpdateEdge),
    DeleteEdge(DeleteEdge),
}

impl Operation {
    /// Edge-class operations run in the second batch phase.
    pub fn is_edge_operation(&self) -> bool {
        matches!(
            self,
            Operation::CreateEdge(_) | Operation::UpdateEdge(_) | Operation::DeleteEdge(_)
        )
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateTextNode(_)
            | Operation::CreateFileNode(_)
            | Operation::CreateLinkNode(_)
            | Operation::CreateGroupNode(_) => OperationKind::CreateNode,
            Operation::UpdateNode(_) => OperationKind::UpdateNode,
            Operation::DeleteNode(_) => OperationKind::DeleteNode,
            Operation::InsertText(_) => OperationKind::InsertText,
            Operation::SearchReplaceText(_) => OperationKind::SearchReplaceText,
            Operation::AppendText(_) => OperationKind::AppendText,
            Operation::PrependText(_) => OperationKind::PrependText,
            Operation::BuildGroup(_) => OperationKind::BuildGroup,
            Operation::CreateEdge(_) => OperationKind::CreateEdge,
            Operation::UpdateEdge(_) => OperationKind::UpdateEdge,
            Operation::DeleteEdge(_) => OperationKind::DeleteEdge,
        }
    }

    /// The placeholder this operation binds, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Operation::CreateTextNode(op) => op.placement.reference.as_deref(),
            Operation::CreateFileNode(op) => op.placement.reference.as_deref(),
            Operation::CreateLinkNode(op) => op.placement.reference.as_deref(),
            Operation::CreateGroupNode(op) => op.placement.reference.as_deref(),
            Operation::BuildGroup(op) => op.reference.as_deref(),
            Operation::CreateEdge(op) => op.reference.as_deref(),
            _ => None,
        }
    }
}

/// What an outcome reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateNode,
    UpdateNode,
    DeleteNode,
    InsertText,
    SearchReplaceText,
    AppendText,
    PrependText,
    BuildGroup,
    CreateEdge,
    UpdateEdge,
    DeleteEdge,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The ledger entry for one executed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// Position of the operation in the submitted list.
    pub index: usize,
    /// Absent when the request could not be interpreted at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    /// Id of the affected node or edge. On failure, the id as submitted
    /// when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl OperationOutcome {
    pub fn succeeded(index: usize, operation: OperationKind, id: impl Into<String>) -> Self {
        OperationOutcome {
            index,
            operation: Some(operation),
            id: Some(id.into()),
            reference: None,
            success: true,
            message: None,
            error_kind: None,
        }
    }

    pub fn failed(index: usize, operation: OperationKind, err: &OpsError) -> Self {
        Self::rejected(index, Some(operation), err.to_string(), err.kind())
    }

    /// A failure that did not come from an [`OpsError`], e.g. a request
    /// that never became an [`Operation`].
    pub fn rejected(
        index: usize,
        operation: Option<OperationKind>,
        message: impl Into<String>,
        kind: ErrorKind,
    ) -> Self {
        OperationOutcome {
            index,
            operation,
            id: None,
            reference: None,
            success: false,
            message: Some(message.into()),
            error_kind: Some(kind),
        }
    }

    pub fn with_reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    pub fn with_id(mut self, id: Option<&str>) -> Self {
        if self.id.is_none() {
            self.id = id.map(str::to_string);
        }
        self
    }
}

/// Result of a two-phase batch: node-class outcomes, edge-class outcomes
/// and the resulting document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub nodes: Vec<OperationOutcome>,
    pub edges: Vec<OperationOutcome>,
    pub document: BoardDocument,
}

impl BatchReport {
    /// All outcomes, node-class first.
    pub fn outcomes(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.nodes.iter().chain(self.edges.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes().filter(|o| !o.success).count()
    }
}
