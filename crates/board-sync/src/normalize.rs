//! Normalization of loosely spelled operation requests.
//!
//! Requests come from callers that spell the same thing many ways:
//! `fromNode` / `from_node` / `from`, `x` + `y` / `pos: [x, y]`,
//! `width` + `height` / `size: [w, h]` / `size: {width, height}`, `content`
//! for `text`, and node or edge fields nested under a `node`, `node_data`,
//! `edge` or `edge_data` wrapper. Normalization produces exactly one typed
//! [`Operation`] per request.
//!
//! Precedence when several spellings are present: the camelCase or
//! structured field, then the snake_case alias, then the shorthand. Keys at
//! the top level win over keys inside a wrapper.
//!
//! A request carrying an `op` tag is already in canonical form and is
//! parsed as-is, which exposes the text-edit and group operations too.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use board_core::{Direction, EdgeEnd, EdgePatch, NodePatch, NodeType, RelativePosition, Side, Size};
use board_ops::{
    CreateEdge, CreateFileNode, CreateGroupNode, CreateLinkNode, CreateTextNode, DeleteEdge,
    DeleteNode, Operation, OperationKind, Placement, UpdateEdge, UpdateNode,
};

use crate::error::NormalizeError;

const WRAPPERS: [&str; 4] = ["node", "node_data", "edge", "edge_data"];

/// The external action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddNode,
    UpdateNode,
    RemoveNode,
    AddEdge,
    UpdateEdge,
    RemoveEdge,
}

impl Action {
    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "add_node" | "addNode" | "create_node" => Some(Action::AddNode),
            "update_node" | "updateNode" => Some(Action::UpdateNode),
            "remove_node" | "removeNode" | "delete_node" => Some(Action::RemoveNode),
            "add_edge" | "addEdge" | "create_edge" => Some(Action::AddEdge),
            "update_edge" | "updateEdge" => Some(Action::UpdateEdge),
            "remove_edge" | "removeEdge" | "delete_edge" => Some(Action::RemoveEdge),
            _ => None,
        }
    }

    pub fn kind(self) -> OperationKind {
        match self {
            Action::AddNode => OperationKind::CreateNode,
            Action::UpdateNode => OperationKind::UpdateNode,
            Action::RemoveNode => OperationKind::DeleteNode,
            Action::AddEdge => OperationKind::CreateEdge,
            Action::UpdateEdge => OperationKind::UpdateEdge,
            Action::RemoveEdge => OperationKind::DeleteEdge,
        }
    }
}

/// Best-effort operation kind of a raw request, for failure reports.
pub fn peek_kind(raw: &Value) -> Option<OperationKind> {
    let obj = raw.as_object()?;
    if let Some(op) = obj.get("op") {
        return serde_json::from_value::<Operation>(Value::Object(obj.clone()))
            .ok()
            .map(|o| o.kind())
            .or_else(|| op.as_str().and_then(Action::parse).map(Action::kind));
    }
    obj.get("action")
        .and_then(Value::as_str)
        .and_then(Action::parse)
        .map(Action::kind)
}

/// Turns one raw request into a typed operation.
pub fn normalize(raw: &Value) -> Result<Operation, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;
    if obj.contains_key("op") {
        return serde_json::from_value(raw.clone()).map_err(|e| NormalizeError::InvalidField {
            field: "op",
            reason: e.to_string(),
        });
    }

    let fields = Fields::flatten(obj);
    let action = fields
        .str(&["action"])?
        .ok_or(NormalizeError::MissingField("action"))?;
    match Action::parse(action) {
        Some(Action::AddNode) => add_node(&fields),
        Some(Action::UpdateNode) => Ok(Operation::UpdateNode(UpdateNode {
            id: fields.required_str("id", &["id", "nodeId", "node_id"])?,
            patch: node_patch(&fields)?,
        })),
        Some(Action::RemoveNode) => Ok(Operation::DeleteNode(DeleteNode {
            id: fields.required_str("id", &["id", "nodeId", "node_id"])?,
        })),
        Some(Action::AddEdge) => add_edge(&fields),
        Some(Action::UpdateEdge) => Ok(Operation::UpdateEdge(UpdateEdge {
            id: fields.required_str("id", &["id", "edgeId", "edge_id"])?,
            patch: edge_patch(&fields)?,
        })),
        Some(Action::RemoveEdge) => Ok(Operation::DeleteEdge(DeleteEdge {
            id: fields.required_str("id", &["id", "edgeId", "edge_id"])?,
        })),
        None => Err(NormalizeError::UnknownAction(action.to_string())),
    }
}

fn add_node(fields: &Fields) -> Result<Operation, NormalizeError> {
    let type_name = fields
        .str(&["type", "nodeType", "node_type"])?
        .ok_or(NormalizeError::MissingField("type"))?;
    let node_type = NodeType::parse(type_name).ok_or_else(|| NormalizeError::InvalidField {
        field: "type",
        reason: format!("unknown node type '{}'", type_name),
    })?;

    let placement = Placement {
        reference: fields.string(&["ref", "reference", "placeholder", "id"])?,
        position: position(fields)?,
        size: size(fields, node_type.default_size())?,
        color: fields.string(&["color"])?,
    };

    Ok(match node_type {
        NodeType::Text => Operation::CreateTextNode(CreateTextNode {
            placement,
            text: fields.required_str("text", &["text", "content"])?,
        }),
        NodeType::File => Operation::CreateFileNode(CreateFileNode {
            placement,
            file: fields.required_str("file", &["file", "filePath", "file_path", "path"])?,
            subpath: fields.string(&["subpath", "sub_path"])?,
            portal: fields.bool(&["portal"])?,
        }),
        NodeType::Link => Operation::CreateLinkNode(CreateLinkNode {
            placement,
            url: fields.required_str("url", &["url", "href"])?,
        }),
        NodeType::Group => Operation::CreateGroupNode(CreateGroupNode {
            placement,
            label: fields.string(&["label", "title"])?,
        }),
    })
}

fn add_edge(fields: &Fields) -> Result<Operation, NormalizeError> {
    let mut edge = CreateEdge::new(
        fields.required_str("fromNode", &["fromNode", "from_node", "from", "source"])?,
        fields.required_str("toNode", &["toNode", "to_node", "to", "target"])?,
    );
    edge.reference = fields.string(&["ref", "reference", "placeholder"])?;
    edge.from_side = side(fields, "fromSide", &["fromSide", "from_side"])?;
    edge.to_side = side(fields, "toSide", &["toSide", "to_side"])?;
    edge.from_end = end(fields, "fromEnd", &["fromEnd", "from_end"])?;
    edge.to_end = end(fields, "toEnd", &["toEnd", "to_end"])?;
    edge.color = fields.string(&["color"])?;
    edge.label = fields.string(&["label"])?;
    Ok(Operation::CreateEdge(edge))
}

fn node_patch(fields: &Fields) -> Result<NodePatch, NormalizeError> {
    let (x, y) = patch_origin(fields)?;
    let (width, height) = match fields.size_shorthand()? {
        Some(s) => (
            fields.number(&["width"])?.or(Some(s.width)),
            fields.number(&["height"])?.or(Some(s.height)),
        ),
        None => (fields.number(&["width"])?, fields.number(&["height"])?),
    };
    Ok(NodePatch {
        x,
        y,
        width,
        height,
        color: fields.string(&["color"])?,
        text: fields.string(&["text", "content"])?,
        file: fields.string(&["file", "filePath", "file_path", "path"])?,
        subpath: fields.string(&["subpath", "sub_path"])?,
        portal: fields.bool(&["portal"])?,
        url: fields.string(&["url", "href"])?,
        label: fields.string(&["label", "title"])?,
        background: fields.string(&["background"])?,
        background_style: fields.parse("backgroundStyle", &["backgroundStyle", "background_style"])?,
    })
}

/// New origin for an update: a `position` object wins, then top-level
/// `x`/`y` over `pos: [x, y]` per coordinate.
fn patch_origin(fields: &Fields) -> Result<(Option<f64>, Option<f64>), NormalizeError> {
    match fields.get(&["position"]) {
        Some(Value::Object(obj)) => {
            let coord = |key: &str| -> Result<Option<f64>, NormalizeError> {
                match obj.get(key) {
                    None => Ok(None),
                    Some(v) => v.as_f64().map(Some).ok_or_else(|| NormalizeError::InvalidField {
                        field: "position",
                        reason: format!("'{}' must be a number", key),
                    }),
                }
            };
            let (x, y) = (coord("x")?, coord("y")?);
            if x.is_none() && y.is_none() {
                return Err(NormalizeError::InvalidField {
                    field: "position",
                    reason: "expected an absolute {x, y}".to_string(),
                });
            }
            return Ok((x, y));
        }
        Some(Value::Array(_)) | None => {}
        Some(_) => {
            return Err(NormalizeError::InvalidField {
                field: "position",
                reason: "expected {x, y} or [x, y]".to_string(),
            })
        }
    }
    let (x, y) = (fields.number(&["x"])?, fields.number(&["y"])?);
    Ok(match fields.pair("pos", &["pos", "position"])? {
        Some((px, py)) => (x.or(Some(px)), y.or(Some(py))),
        None => (x, y),
    })
}

fn edge_patch(fields: &Fields) -> Result<EdgePatch, NormalizeError> {
    Ok(EdgePatch {
        from_node: fields
            .string(&["fromNode", "from_node", "from", "source"])?
            .map(Into::into),
        to_node: fields
            .string(&["toNode", "to_node", "to", "target"])?
            .map(Into::into),
        from_side: side(fields, "fromSide", &["fromSide", "from_side"])?,
        to_side: side(fields, "toSide", &["toSide", "to_side"])?,
        from_end: end(fields, "fromEnd", &["fromEnd", "from_end"])?,
        to_end: end(fields, "toEnd", &["toEnd", "to_end"])?,
        color: fields.string(&["color"])?,
        label: fields.string(&["label"])?,
    })
}

/// Structured `position` object, then `x`/`y`, then `pos: [x, y]`, then a
/// `relativeTo` anchor with a `direction`.
fn position(fields: &Fields) -> Result<RelativePosition, NormalizeError> {
    if let Some(value) = fields.get(&["position"]) {
        if value.is_object() {
            return serde_json::from_value(value.clone()).map_err(|e| {
                NormalizeError::InvalidField {
                    field: "position",
                    reason: e.to_string(),
                }
            });
        }
    }
    let x = fields.number(&["x"])?;
    let y = fields.number(&["y"])?;
    if x.is_some() || y.is_some() {
        return Ok(RelativePosition::Absolute {
            x: x.unwrap_or(0.0),
            y: y.unwrap_or(0.0),
        });
    }
    if let Some((x, y)) = fields.pair("pos", &["pos", "position"])? {
        return Ok(RelativePosition::Absolute { x, y });
    }
    if let Some(anchor) = fields.string(&["relativeTo", "relative_to"])? {
        let direction: Direction = fields
            .parse("direction", &["direction"])?
            .unwrap_or(Direction::Right);
        return Ok(RelativePosition::Relative {
            node_id: anchor,
            direction,
            offset: fields.number(&["offset"])?,
        });
    }
    if let Some(anchor) = fields.string(&["near"])? {
        return Ok(RelativePosition::Near { node_id: anchor });
    }
    Ok(RelativePosition::default())
}

/// `width`/`height` fields win over a `size` shorthand; a missing side
/// falls back to the type default. `None` when nothing was given.
fn size(fields: &Fields, default: Size) -> Result<Option<Size>, NormalizeError> {
    let width = fields.number(&["width"])?;
    let height = fields.number(&["height"])?;
    let shorthand = fields.size_shorthand()?;
    if width.is_none() && height.is_none() && shorthand.is_none() {
        return Ok(None);
    }
    let base = shorthand.unwrap_or(default);
    Ok(Some(Size::new(
        width.unwrap_or(base.width),
        height.unwrap_or(base.height),
    )))
}

fn side(fields: &Fields, name: &'static str, keys: &[&str]) -> Result<Option<Side>, NormalizeError> {
    match fields.str(keys)? {
        Some(s) => Side::parse(s).map(Some).ok_or_else(|| NormalizeError::InvalidField {
            field: name,
            reason: format!("'{}' is not one of top, right, bottom, left", s),
        }),
        None => Ok(None),
    }
}

fn end(fields: &Fields, name: &'static str, keys: &[&str]) -> Result<Option<EdgeEnd>, NormalizeError> {
    match fields.str(keys)? {
        Some(s) => EdgeEnd::parse(s).map(Some).ok_or_else(|| NormalizeError::InvalidField {
            field: name,
            reason: format!("'{}' is not one of none, arrow", s),
        }),
        None => Ok(None),
    }
}

/// A request object with wrapper objects merged into the top level.
struct Fields(Map<String, Value>);

impl Fields {
    fn flatten(obj: &Map<String, Value>) -> Fields {
        let mut merged = obj.clone();
        for wrapper in WRAPPERS {
            if let Some(Value::Object(inner)) = obj.get(wrapper) {
                for (key, value) in inner {
                    merged.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        Fields(merged)
    }

    /// First non-null value among `keys`, in precedence order.
    fn get(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    fn str(&self, keys: &[&str]) -> Result<Option<&str>, NormalizeError> {
        match self.get(keys) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(NormalizeError::InvalidField {
                field: static_name(keys),
                reason: "expected a string".to_string(),
            }),
        }
    }

    fn string(&self, keys: &[&str]) -> Result<Option<String>, NormalizeError> {
        Ok(self.str(keys)?.map(str::to_string))
    }

    fn required_str(&self, name: &'static str, keys: &[&str]) -> Result<String, NormalizeError> {
        self.string(keys)?.ok_or(NormalizeError::MissingField(name))
    }

    fn number(&self, keys: &[&str]) -> Result<Option<f64>, NormalizeError> {
        match self.get(keys) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| NormalizeError::InvalidField {
                field: static_name(keys),
                reason: "expected a number".to_string(),
            }),
        }
    }

    fn bool(&self, keys: &[&str]) -> Result<Option<bool>, NormalizeError> {
        match self.get(keys) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| NormalizeError::InvalidField {
                field: static_name(keys),
                reason: "expected true or false".to_string(),
            }),
        }
    }

    fn parse<T: DeserializeOwned>(
        &self,
        name: &'static str,
        keys: &[&str],
    ) -> Result<Option<T>, NormalizeError> {
        match self.get(keys) {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| NormalizeError::InvalidField {
                    field: name,
                    reason: e.to_string(),
                }),
        }
    }

    /// A `[a, b]` numeric tuple under one of `keys`. Non-array values are
    /// left to other readers.
    fn pair(&self, name: &'static str, keys: &[&str]) -> Result<Option<(f64, f64)>, NormalizeError> {
        match self.get(keys) {
            Some(Value::Array(items)) => match items.as_slice() {
                [a, b] => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => Ok(Some((a, b))),
                    _ => Err(NormalizeError::InvalidField {
                        field: name,
                        reason: "expected two numbers".to_string(),
                    }),
                },
                _ => Err(NormalizeError::InvalidField {
                    field: name,
                    reason: format!("expected two numbers, got {}", items.len()),
                }),
            },
            _ => Ok(None),
        }
    }

    /// `size` as `[w, h]` or `{width, height}`.
    fn size_shorthand(&self) -> Result<Option<Size>, NormalizeError> {
        match self.get(&["size"]) {
            Some(Value::Object(_)) => self.parse("size", &["size"]),
            Some(Value::Array(_)) => Ok(self
                .pair("size", &["size"])?
                .map(|(w, h)| Size::new(w, h))),
            Some(_) => Err(NormalizeError::InvalidField {
                field: "size",
                reason: "expected [width, height] or {width, height}".to_string(),
            }),
            None => Ok(None),
        }
    }
}

/// Canonical field name for error messages: the highest-precedence key.
fn static_name(keys: &[&str]) -> &'static str {
    const KNOWN: &[&str] = &[
        "action", "id", "type", "ref", "color", "text", "file", "subpath", "portal", "url",
        "label", "background", "x", "y", "width", "height", "offset", "fromNode", "toNode",
        "fromSide", "toSide", "fromEnd", "toEnd", "relativeTo", "near", "direction",
    ];
    keys.first()
        .and_then(|k| KNOWN.iter().find(|known| *known == k))
        .copied()
        .unwrap_or("field")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn placement(op: &Operation) -> &Placement {
        match op {
            Operation::CreateTextNode(o) => &o.placement,
            Operation::CreateFileNode(o) => &o.placement,
            Operation::CreateLinkNode(o) => &o.placement,
            Operation::CreateGroupNode(o) => &o.placement,
            other => panic!("not a create: {:?}", other),
        }
    }

    #[test]
    fn shorthand_text_node() {
        let op = normalize(&json!({
            "action": "add_node", "type": "text", "content": "hi",
            "pos": [10, 20], "size": [100, 40], "ref": "a"
        }))
        .unwrap();
        let Operation::CreateTextNode(create) = &op else {
            panic!("expected text create");
        };
        assert_eq!(create.text, "hi");
        assert_eq!(create.placement.reference.as_deref(), Some("a"));
        assert_eq!(create.placement.position, RelativePosition::Absolute { x: 10.0, y: 20.0 });
        assert_eq!(create.placement.size, Some(Size::new(100.0, 40.0)));
    }

    #[test]
    fn explicit_fields_beat_shorthand() {
        let op = normalize(&json!({
            "action": "add_node", "type": "text", "text": "explicit", "content": "short",
            "x": 1, "y": 2, "pos": [9, 9],
            "width": 300, "size": {"width": 10, "height": 50}
        }))
        .unwrap();
        let Operation::CreateTextNode(create) = &op else {
            panic!("expected text create");
        };
        assert_eq!(create.text, "explicit");
        assert_eq!(create.placement.position, RelativePosition::Absolute { x: 1.0, y: 2.0 });
        assert_eq!(create.placement.size, Some(Size::new(300.0, 50.0)));
    }

    #[test]
    fn wrapper_fields_are_flattened_with_top_level_winning() {
        let op = normalize(&json!({
            "action": "add_node", "color": "1",
            "node_data": {"type": "link", "url": "https://a", "color": "5"}
        }))
        .unwrap();
        let Operation::CreateLinkNode(create) = &op else {
            panic!("expected link create");
        };
        assert_eq!(create.url, "https://a");
        assert_eq!(create.placement.color.as_deref(), Some("1"));
    }

    #[test]
    fn edge_aliases() {
        let camel = normalize(&json!({"action": "add_edge", "fromNode": "a", "from": "z", "to_node": "b"})).unwrap();
        let Operation::CreateEdge(edge) = camel else {
            panic!("expected edge create");
        };
        assert_eq!((edge.from_node.as_str(), edge.to_node.as_str()), ("a", "b"));

        let wrapped = normalize(&json!({
            "action": "add_edge",
            "edge": {"from": "x", "to": "y", "from_side": "bottom", "toEnd": "arrow"}
        }))
        .unwrap();
        let Operation::CreateEdge(edge) = wrapped else {
            panic!("expected edge create");
        };
        assert_eq!(edge.from_side, Some(Side::Bottom));
        assert_eq!(edge.to_end, Some(EdgeEnd::Arrow));
    }

    #[test]
    fn missing_required_fields_are_named() {
        assert_eq!(
            normalize(&json!({"action": "add_node", "text": "t"})).unwrap_err(),
            NormalizeError::MissingField("type")
        );
        assert_eq!(
            normalize(&json!({"action": "add_node", "type": "link"})).unwrap_err(),
            NormalizeError::MissingField("url")
        );
        assert_eq!(
            normalize(&json!({"action": "add_edge", "from": "a"})).unwrap_err(),
            NormalizeError::MissingField("toNode")
        );
        assert_eq!(
            normalize(&json!({"type": "text"})).unwrap_err(),
            NormalizeError::MissingField("action")
        );
    }

    #[test]
    fn unknown_action_and_bad_values() {
        assert_eq!(
            normalize(&json!({"action": "explode"})).unwrap_err(),
            NormalizeError::UnknownAction("explode".into())
        );
        let err = normalize(&json!({"action": "add_edge", "from": "a", "to": "b", "fromSide": "middle"})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidField { field: "fromSide", .. }));
        let err = normalize(&json!({"action": "add_node", "type": "text", "text": "t", "x": "left"})).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidField { field: "x", .. }));
        assert_eq!(normalize(&json!([1, 2])).unwrap_err(), NormalizeError::NotAnObject);
    }

    #[test]
    fn update_node_builds_patch() {
        let op = normalize(&json!({"action": "update_node", "node_id": "n1", "content": "new", "pos": [5, 6]})).unwrap();
        let Operation::UpdateNode(update) = op else {
            panic!("expected update");
        };
        assert_eq!(update.id, "n1");
        assert_eq!(update.patch.text.as_deref(), Some("new"));
        assert_eq!((update.patch.x, update.patch.y), (Some(5.0), Some(6.0)));
        assert_eq!(update.patch.width, None);
    }

    #[test]
    fn update_node_reads_structured_position() {
        let op = normalize(&json!({
            "action": "update_node", "id": "n1", "position": {"x": 5, "y": 6}, "x": 99
        }))
        .unwrap();
        let Operation::UpdateNode(update) = op else {
            panic!("expected update");
        };
        assert_eq!((update.patch.x, update.patch.y), (Some(5.0), Some(6.0)));

        let partial = normalize(&json!({"action": "update_node", "id": "n1", "position": {"y": -20}})).unwrap();
        let Operation::UpdateNode(update) = partial else {
            panic!("expected update");
        };
        assert_eq!((update.patch.x, update.patch.y), (None, Some(-20.0)));
    }

    #[test]
    fn update_node_rejects_unusable_position() {
        for position in [json!({"kind": "center"}), json!({"x": "left"}), json!("top")] {
            let err = normalize(&json!({"action": "update_node", "id": "n1", "position": position}))
                .unwrap_err();
            assert!(
                matches!(err, NormalizeError::InvalidField { field: "position", .. }),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn relative_shorthand_and_structured_position() {
        let op = normalize(&json!({
            "action": "add_node", "type": "group", "relativeTo": "a", "direction": "below"
        }))
        .unwrap();
        assert_eq!(
            placement(&op).position,
            RelativePosition::Relative {
                node_id: "a".into(),
                direction: Direction::Below,
                offset: None
            }
        );

        let op = normalize(&json!({
            "action": "add_node", "type": "file", "file_path": "a.md",
            "position": {"kind": "center"}
        }))
        .unwrap();
        assert_eq!(placement(&op).position, RelativePosition::Center);
    }

    #[test]
    fn canonical_operations_pass_through() {
        let op = normalize(&json!({"op": "append_text", "id": "n", "content": "!"})).unwrap();
        assert!(matches!(op, Operation::AppendText(_)));
        assert_eq!(peek_kind(&json!({"action": "remove_edge"})), Some(OperationKind::DeleteEdge));
        assert_eq!(peek_kind(&json!({"action": "nope"})), None);
    }
}
