//! Node types and core node functionality

use super::port::{ConnectionPoint, HandleRole};
use super::shape::Shape;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Allocate a fresh node id
pub fn new_node_id() -> NodeId {
    format!("node-{}", uuid::Uuid::new_v4())
}

/// Core node structure representing a visual node in the flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub shape: Shape,
    #[serde(with = "vec2_serde")]
    pub position: Vec2,
    pub label: String,
    pub color: String,
    pub content: String,
    pub connection_points: Vec<ConnectionPoint>,
}

impl Node {
    /// Creates a new node with the default connection points for its shape
    pub fn new(
        id: impl Into<NodeId>,
        shape: Shape,
        position: Vec2,
        label: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let connection_points = shape.default_connection_points(&id);
        Self {
            id,
            shape,
            position,
            label: label.into(),
            color: color.into(),
            content: String::new(),
            connection_points,
        }
    }

    /// Find a connection point by id
    pub fn connection_point(&self, handle: &str) -> Option<&ConnectionPoint> {
        self.connection_points.iter().find(|p| p.id == handle)
    }

    /// Check if the node owns a handle with the given id and role
    pub fn has_handle(&self, handle: &str, role: HandleRole) -> bool {
        self.connection_point(handle).is_some_and(|p| p.role == role)
    }

    /// Switch shape, regenerating connection points and relabelling.
    ///
    /// `next_number` is used when the current label has no trailing number.
    pub fn reshape(&mut self, shape: Shape, next_number: usize) {
        let number = trailing_number(&self.label)
            .map(str::to_string)
            .unwrap_or_else(|| next_number.to_string());
        self.shape = shape;
        self.label = format!("{} {}", shape.display_name(), number);
        self.connection_points = shape.default_connection_points(&self.id);
    }

    /// Merge a partial field update into the node
    pub fn apply_fields(&mut self, fields: &NodeFields) {
        if let Some(label) = &fields.label {
            self.label = label.clone();
        }
        if let Some(color) = &fields.color {
            self.color = color.clone();
        }
        if let Some(content) = &fields.content {
            self.content = content.clone();
        }
    }

    /// Check that connection point ids are unique within the node
    pub fn has_unique_handles(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.connection_points.iter().all(|p| seen.insert(p.id.as_str()))
    }
}

/// Partial update of the user-editable node fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NodeFields {
    pub fn label(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..Self::default() }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self { color: Some(color.into()), ..Self::default() }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.color.is_none() && self.content.is_none()
    }
}

/// Default label for the n-th node of a shape
pub fn default_label(shape: Shape, number: usize) -> String {
    format!("{} {}", shape.display_name(), number)
}

/// Trailing run of digits of a label, if its last word is a number
pub fn trailing_number(label: &str) -> Option<&str> {
    let last = label.split_whitespace().last()?;
    if last.chars().all(|c| c.is_ascii_digit()) {
        Some(last)
    } else {
        None
    }
}

// Serde helper module for Vec2, stored as {x, y}
pub(crate) mod vec2_serde {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f32,
        y: f32,
    }

    pub fn serialize<S>(pos: &Vec2, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Xy { x: pos.x, y: pos.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Xy { x, y } = Xy::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}
