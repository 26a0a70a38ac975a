//! Flow graph data structures and operations

use super::node::{default_label, new_node_id, Node, NodeFields, NodeId};
use super::port::{HandleId, HandleRole};
use super::shape::Shape;
use crate::config::ColorPolicy;
use crate::constants::{edge, palette};
use crate::error::{FlowError, Result};
use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Unique identifier for an edge
pub type EdgeId = String;

/// Allocate a fresh edge id
pub fn new_edge_id() -> EdgeId {
    format!("edge-{}", uuid::Uuid::new_v4())
}

/// Visual contract of an edge; constant across all edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub kind: String,
    pub animated: bool,
    pub stroke: String,
    pub stroke_width: f32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            kind: edge::KIND.to_string(),
            animated: edge::ANIMATED,
            stroke: edge::STROKE.to_string(),
            stroke_width: edge::STROKE_WIDTH,
        }
    }
}

/// Directed connection between a source handle and a target handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: HandleId,
    pub target_handle: HandleId,
    pub style: EdgeStyle,
}

impl Edge {
    /// Creates a new edge with the fixed style
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        source_handle: impl Into<HandleId>,
        target: impl Into<NodeId>,
        target_handle: impl Into<HandleId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: source_handle.into(),
            target_handle: target_handle.into(),
            style: EdgeStyle::default(),
        }
    }

    /// Check if either endpoint is the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The live node and edge collections
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    color_policy: ColorPolicy,
}

impl FlowGraph {
    /// Creates a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty graph with a colour policy for new nodes
    pub fn with_color_policy(color_policy: ColorPolicy) -> Self {
        Self {
            color_policy,
            ..Self::default()
        }
    }

    /// Replace the contents of the graph, keeping the colour policy
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes;
        self.edges = edges;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges whose source or target is the given node
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    fn count_shape(&self, shape: Shape) -> usize {
        self.nodes.iter().filter(|n| n.shape == shape).count()
    }

    /// Adds a new node with default label, colour and connection points
    pub fn create_node(&mut self, shape: Shape, position: Vec2) -> Node {
        let label = default_label(shape, self.count_shape(shape) + 1);
        let color = self.color_policy.pick(self.nodes.len());
        let node = Node::new(new_node_id(), shape, position, label, color);
        debug!("Created {} node {} at ({:.1}, {:.1})", shape, node.id, position.x, position.y);
        self.nodes.push(node.clone());
        node
    }

    /// Removes a node and every edge attached to it
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        let edges_before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        debug!("Removed node {} and {} edge(s)", id, edges_before - self.edges.len());
        true
    }

    /// Switches a node to a new shape.
    ///
    /// Connection points are regenerated, so edges that used the old handles
    /// are removed along with them.
    pub fn change_shape(&mut self, id: &str, shape: Shape) -> bool {
        let next_number = self.count_shape(shape) + 1;
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.shape == shape {
            return false;
        }
        node.reshape(shape, next_number);
        let node = node.clone();

        let before = self.edges.len();
        self.edges.retain(|e| {
            (e.source != node.id || node.has_handle(&e.source_handle, HandleRole::Source))
                && (e.target != node.id || node.has_handle(&e.target_handle, HandleRole::Target))
        });
        debug!(
            "Node {} is now {} ({}), dropped {} edge(s)",
            id,
            shape,
            node.label,
            before - self.edges.len()
        );
        true
    }

    /// Merges a partial update into a node.
    ///
    /// Colours outside the palette are ignored.
    pub fn update_node_fields(&mut self, id: &str, fields: &NodeFields) -> bool {
        let mut fields = fields.clone();
        if let Some(color) = &fields.color {
            if !palette::contains(color) {
                warn!("Ignoring colour {} for node {}: not in palette", color, id);
                fields.color = None;
            }
        }
        if fields.is_empty() {
            return false;
        }
        match self.node_mut(id) {
            Some(node) => {
                node.apply_fields(&fields);
                true
            }
            None => false,
        }
    }

    /// Updates a node's position only
    pub fn move_node(&mut self, id: &str, position: Vec2) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Connects a source handle to a target handle
    pub fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Result<Edge> {
        self.check_handle(source, source_handle, HandleRole::Source)?;
        self.check_handle(target, target_handle, HandleRole::Target)?;

        let edge = Edge::new(new_edge_id(), source, source_handle, target, target_handle);
        debug!("Connected {}:{} -> {}:{}", source, source_handle, target, target_handle);
        self.edges.push(edge.clone());
        Ok(edge)
    }

    fn check_handle(&self, node_id: &str, handle: &str, role: HandleRole) -> Result<()> {
        let node = self
            .node(node_id)
            .ok_or_else(|| FlowError::DanglingReference(format!("node {} does not exist", node_id)))?;
        let point = node.connection_point(handle).ok_or_else(|| {
            FlowError::DanglingReference(format!("handle {} does not exist on node {}", handle, node_id))
        })?;
        if point.role != role {
            return Err(FlowError::HandleRole {
                handle: handle.to_string(),
                expected: role.name(),
            });
        }
        Ok(())
    }

    /// Removes a single edge
    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Empties both collections
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}
