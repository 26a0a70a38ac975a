//! Shape registry
//!
//! Maps each node shape to its default connection-point layout. Handle ids are
//! derived from the owning node id plus a fixed per-shape suffix, so the same
//! node/shape pair always produces the same ids.

use super::port::{ConnectionPoint, HandleRole, Side};
use crate::constants::handle::{CENTER, FAR, NEAR};
use crate::error::FlowError;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shapes a node can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rectangle,
    Circle,
}

/// One entry of a shape's handle layout
struct HandleSlot {
    suffix: &'static str,
    role: HandleRole,
    side: Side,
    offset: f32,
}

const RECTANGLE_LAYOUT: &[HandleSlot] = &[
    HandleSlot { suffix: "target-left", role: HandleRole::Target, side: Side::Left, offset: CENTER },
    HandleSlot { suffix: "source-right", role: HandleRole::Source, side: Side::Right, offset: CENTER },
];

const CIRCLE_LAYOUT: &[HandleSlot] = &[
    HandleSlot { suffix: "target-top-left", role: HandleRole::Target, side: Side::Top, offset: NEAR },
    HandleSlot { suffix: "target-top-right", role: HandleRole::Target, side: Side::Top, offset: FAR },
    HandleSlot { suffix: "source-bottom-left", role: HandleRole::Source, side: Side::Bottom, offset: NEAR },
    HandleSlot { suffix: "source-bottom-right", role: HandleRole::Source, side: Side::Bottom, offset: FAR },
    HandleSlot { suffix: "target-left-upper", role: HandleRole::Target, side: Side::Left, offset: NEAR },
    HandleSlot { suffix: "target-left-lower", role: HandleRole::Target, side: Side::Left, offset: FAR },
    HandleSlot { suffix: "source-right-upper", role: HandleRole::Source, side: Side::Right, offset: NEAR },
    HandleSlot { suffix: "source-right-lower", role: HandleRole::Source, side: Side::Right, offset: FAR },
];

impl Shape {
    /// All registered shapes
    pub const ALL: [Shape; 2] = [Shape::Rectangle, Shape::Circle];

    /// Lowercase tag used in persisted state
    pub fn tag(&self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Circle => "circle",
        }
    }

    /// Human-readable name, also the default label prefix
    pub fn display_name(&self) -> &'static str {
        match self {
            Shape::Rectangle => "Rectangle",
            Shape::Circle => "Circle",
        }
    }

    fn layout(&self) -> &'static [HandleSlot] {
        match self {
            Shape::Rectangle => RECTANGLE_LAYOUT,
            Shape::Circle => CIRCLE_LAYOUT,
        }
    }

    /// Default connection points for a node of this shape
    pub fn default_connection_points(&self, node_id: &str) -> Vec<ConnectionPoint> {
        self.layout()
            .iter()
            .map(|slot| {
                ConnectionPoint::new(handle_id(node_id, slot.suffix), slot.role, slot.side, slot.offset)
            })
            .collect()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Shape {
    type Err = FlowError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.tag().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| FlowError::UnknownShape(tag.to_string()))
    }
}

/// Build the handle id for a node and a layout suffix
pub fn handle_id(node_id: &str, suffix: &str) -> String {
    format!("{}-{}", node_id, suffix)
}

/// Default connection points for an untyped shape tag.
///
/// Unknown tags are logged and yield no connection points.
pub fn connection_points_for_tag(tag: &str, node_id: &str) -> Vec<ConnectionPoint> {
    match tag.parse::<Shape>() {
        Ok(shape) => shape.default_connection_points(node_id),
        Err(e) => {
            error!("{} (node {})", e, node_id);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_layout() {
        let points = Shape::Rectangle.default_connection_points("n1");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, "n1-target-left");
        assert!(points[0].is_target());
        assert_eq!(points[0].side, Side::Left);
        assert_eq!(points[1].id, "n1-source-right");
        assert!(points[1].is_source());
        assert_eq!(points[1].side, Side::Right);
    }

    #[test]
    fn test_circle_layout() {
        let points = Shape::Circle.default_connection_points("c");
        assert_eq!(points.len(), 8);

        let count = |role: HandleRole, side: Side| {
            points.iter().filter(|p| p.role == role && p.side == side).count()
        };
        assert_eq!(count(HandleRole::Target, Side::Top), 2);
        assert_eq!(count(HandleRole::Source, Side::Bottom), 2);
        assert_eq!(count(HandleRole::Target, Side::Left), 2);
        assert_eq!(count(HandleRole::Source, Side::Right), 2);

        let mut ids: Vec<_> = points.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| id.starts_with("c-")));
    }

    #[test]
    fn test_layout_is_deterministic() {
        assert_eq!(
            Shape::Circle.default_connection_points("same"),
            Shape::Circle.default_connection_points("same")
        );
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("rectangle".parse::<Shape>().unwrap(), Shape::Rectangle);
        assert_eq!("Circle".parse::<Shape>().unwrap(), Shape::Circle);
        assert!(matches!("triangle".parse::<Shape>(), Err(FlowError::UnknownShape(_))));
    }

    #[test]
    fn test_unknown_tag_yields_no_points() {
        assert!(connection_points_for_tag("triangle", "n1").is_empty());
        assert_eq!(connection_points_for_tag("circle", "n1").len(), 8);
    }
}
