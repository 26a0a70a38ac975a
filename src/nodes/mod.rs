//! Node system - flow graph data structures and the shape registry

pub mod graph;
pub mod node;
pub mod port;
pub mod shape;

// Re-export core types
pub use graph::{Edge, EdgeId, EdgeStyle, FlowGraph};
pub use node::{Node, NodeFields, NodeId};
pub use port::{ConnectionPoint, HandleId, HandleRole, Side};
pub use shape::{connection_points_for_tag, Shape};
