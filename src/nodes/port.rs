//! Connection point types for node connections

use serde::{Deserialize, Serialize};

/// Unique identifier for a connection point, unique within its node
pub type HandleId = String;

/// Direction of a connection point (edge origin or edge destination)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleRole {
    Source,
    Target,
}

impl HandleRole {
    /// Lowercase name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            HandleRole::Source => "source",
            HandleRole::Target => "target",
        }
    }
}

/// Side of the node boundary a connection point sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Named anchor on a node's boundary that an edge may attach to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub id: HandleId,
    pub role: HandleRole,
    pub side: Side,
    /// Fraction (0..=1) along the side, measured from its top/left end
    pub offset: f32,
}

impl ConnectionPoint {
    /// Creates a new connection point
    pub fn new(id: impl Into<HandleId>, role: HandleRole, side: Side, offset: f32) -> Self {
        Self {
            id: id.into(),
            role,
            side,
            offset: offset.clamp(0.0, 1.0),
        }
    }

    /// Checks if edges may start here
    pub fn is_source(&self) -> bool {
        matches!(self.role, HandleRole::Source)
    }

    /// Checks if edges may end here
    pub fn is_target(&self) -> bool {
        matches!(self.role, HandleRole::Target)
    }
}
