//! Geometry primitives: points, sizes, bounding boxes and relative
//! positions.
//!
//! Coordinates are `f64`. Boards written by the host carry integers, so
//! whole values are serialized back as JSON integers (see [`coord`]) to keep
//! documents byte-stable across a read/write cycle.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Default gap between a node and its anchor for relative placement.
pub const DEFAULT_OFFSET: f64 = 50.0;

/// An absolute position on the board (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(serialize_with = "coord::serialize")]
    pub x: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Translates this point by `offset`.
    pub fn offset_by(self, offset: Point) -> Point {
        Point::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Width and height of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    #[serde(serialize_with = "coord::serialize")]
    pub width: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// Axis-aligned box. Derived from node rectangles, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(serialize_with = "coord::serialize")]
    pub x: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub y: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub width: f64,
    #[serde(serialize_with = "coord::serialize")]
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if `point` lies inside the box, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Side of an anchor node used by relative placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
}

/// A requested position, resolved to an absolute [`Point`] when a node is
/// created. Never stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RelativePosition {
    /// Use the coordinates as given.
    Absolute {
        x: f64,
        y: f64,
    },
    /// Place next to `node_id` on the `direction` side, `offset` apart
    /// (default [`DEFAULT_OFFSET`]).
    Relative {
        #[serde(alias = "nodeId")]
        node_id: String,
        direction: Direction,
        #[serde(default)]
        offset: Option<f64>,
    },
    /// The mean of all node origins.
    Center,
    /// Somewhere next to `node_id`.
    Near {
        #[serde(alias = "nodeId")]
        node_id: String,
    },
}

impl Default for RelativePosition {
    fn default() -> Self {
        RelativePosition::Absolute { x: 0.0, y: 0.0 }
    }
}

impl RelativePosition {
    /// Returns the anchor id for `Relative` and `Near`.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            RelativePosition::Relative { node_id, .. } | RelativePosition::Near { node_id } => {
                Some(node_id.as_str())
            }
            RelativePosition::Absolute { .. } | RelativePosition::Center => None,
        }
    }

    /// Returns a copy with the anchor replaced by `resolved`.
    pub fn with_anchor(&self, resolved: &NodeId) -> RelativePosition {
        match self {
            RelativePosition::Relative {
                direction, offset, ..
            } => RelativePosition::Relative {
                node_id: resolved.to_string(),
                direction: *direction,
                offset: *offset,
            },
            RelativePosition::Near { .. } => RelativePosition::Near {
                node_id: resolved.to_string(),
            },
            other => other.clone(),
        }
    }
}

/// Serializer for coordinates: whole numbers go out as JSON integers.
pub mod coord {
    use serde::Serializer;

    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_coordinates_serialize_as_integers() {
        let json = serde_json::to_string(&Point::new(300.0, -20.0)).unwrap();
        assert_eq!(json, r#"{"x":300,"y":-20}"#);
    }

    #[test]
    fn fractional_coordinates_keep_precision() {
        let json = serde_json::to_string(&Point::new(1.5, 0.0)).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":0}"#);
    }

    #[test]
    fn bounding_box_contains_edges() {
        let bb = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        assert!(bb.contains(Point::new(0.0, 0.0)));
        assert!(bb.contains(Point::new(100.0, 50.0)));
        assert!(!bb.contains(Point::new(101.0, 10.0)));
    }

    #[test]
    fn relative_position_deserializes_with_camel_anchor() {
        let pos: RelativePosition = serde_json::from_value(serde_json::json!({
            "kind": "relative",
            "nodeId": "a",
            "direction": "below"
        }))
        .unwrap();
        assert_eq!(
            pos,
            RelativePosition::Relative {
                node_id: "a".into(),
                direction: Direction::Below,
                offset: None,
            }
        );
        assert_eq!(pos.anchor(), Some("a"));
    }
}
