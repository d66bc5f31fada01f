//! Board nodes.
//!
//! A [`Node`] carries the geometry shared by every kind plus a closed
//! [`NodeKind`] for the kind-specific payload. The kind is serialized as an
//! internal `"type"` tag, so a node reads and writes as the flat object the
//! host stores:
//!
//! ```json
//! { "id": "n1", "type": "text", "text": "hi", "x": 0, "y": 0, "width": 250, "height": 60 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{coord, BoundingBox, Point, Size};
use crate::id::NodeId;

/// A positioned, sized element of the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(serialize_with = "coord::serialize")]
    pub x: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub y: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub width: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Kind-specific node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Text {
        #[serde(default)]
        text: String,
    },
    File {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subpath: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        portal: Option<bool>,
    },
    Link {
        url: String,
    },
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<String>,
        #[serde(
            default,
            rename = "backgroundStyle",
            skip_serializing_if = "Option::is_none"
        )]
        background_style: Option<BackgroundStyle>,
    },
}

/// How a group's background image is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    Cover,
    Ratio,
    Repeat,
}

/// The tag of a [`NodeKind`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Text,
    File,
    Link,
    Group,
}

impl NodeType {
    /// Size used when a create request does not supply one.
    pub fn default_size(self) -> Size {
        match self {
            NodeType::Text => Size::new(250.0, 60.0),
            NodeType::File => Size::new(400.0, 400.0),
            NodeType::Link => Size::new(300.0, 100.0),
            NodeType::Group => Size::new(600.0, 400.0),
        }
    }

    /// Prefix for generated ids of this kind.
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeType::Text => "text_node",
            NodeType::File => "file_node",
            NodeType::Link => "link_node",
            NodeType::Group => "group_node",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Text => "text",
            NodeType::File => "file",
            NodeType::Link => "link",
            NodeType::Group => "group",
        }
    }

    /// Parses the lowercase tag used in documents.
    pub fn parse(s: &str) -> Option<NodeType> {
        match s {
            "text" => Some(NodeType::Text),
            "file" => Some(NodeType::File),
            "link" => Some(NodeType::Link),
            "group" => Some(NodeType::Group),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::File { .. } => NodeType::File,
            NodeKind::Link { .. } => NodeType::Link,
            NodeKind::Group { .. } => NodeType::Group,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text { text: text.into() }
    }

    pub fn file(file: impl Into<String>) -> Self {
        NodeKind::File {
            file: file.into(),
            subpath: None,
            portal: None,
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        NodeKind::Link { url: url.into() }
    }

    pub fn group(label: Option<String>) -> Self {
        NodeKind::Group {
            label,
            background: None,
            background_style: None,
        }
    }
}

impl Node {
    /// Creates a node at `origin` with the given size.
    pub fn new(id: NodeId, kind: NodeKind, origin: Point, size: Size) -> Self {
        Node {
            id,
            kind,
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            color: None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The rectangle this node covers.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    /// The text body, if this is a text node.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A partial node update. Only present fields are applied; kind-specific
/// fields are applied only when the target node is of that kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_style: Option<BackgroundStyle>,
}

impl NodePatch {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == NodePatch::default()
    }

    /// Merges the present fields into `node`.
    pub fn apply(&self, node: &mut Node) {
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(width) = self.width {
            node.width = width;
        }
        if let Some(height) = self.height {
            node.height = height;
        }
        if let Some(color) = &self.color {
            node.color = Some(color.clone());
        }

        match &mut node.kind {
            NodeKind::Text { text } => {
                if let Some(new_text) = &self.text {
                    *text = new_text.clone();
                }
            }
            NodeKind::File {
                file,
                subpath,
                portal,
            } => {
                if let Some(new_file) = &self.file {
                    *file = new_file.clone();
                }
                if let Some(new_subpath) = &self.subpath {
                    *subpath = Some(new_subpath.clone());
                }
                if let Some(new_portal) = self.portal {
                    *portal = Some(new_portal);
                }
            }
            NodeKind::Link { url } => {
                if let Some(new_url) = &self.url {
                    *url = new_url.clone();
                }
            }
            NodeKind::Group {
                label,
                background,
                background_style,
            } => {
                if let Some(new_label) = &self.label {
                    *label = Some(new_label.clone());
                }
                if let Some(new_background) = &self.background {
                    *background = Some(new_background.clone());
                }
                if let Some(style) = self.background_style {
                    *background_style = Some(style);
                }
            }
        }
    }
}
