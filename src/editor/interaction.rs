//! Node interaction handling (selection, dragging)

use crate::nodes::{EdgeId, FlowGraph, NodeId};
use glam::Vec2;
use std::collections::{HashMap, HashSet};

/// Manages node selection and drag gestures
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    pub selected_nodes: HashSet<NodeId>,
    pub selected_edges: HashSet<EdgeId>,
    drag_offsets: HashMap<NodeId, Vec2>,
    /// Positions changed since the gesture started or the last settle
    moved: bool,
}

impl InteractionManager {
    /// Creates a new interaction manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single node, optionally keeping existing selection
    pub fn select_node(&mut self, node_id: &str, multi_select: bool) {
        if multi_select {
            if !self.selected_nodes.remove(node_id) {
                self.selected_nodes.insert(node_id.to_string());
            }
        } else {
            self.selected_nodes.clear();
            self.selected_edges.clear();
            self.selected_nodes.insert(node_id.to_string());
        }
    }

    /// Select an edge with multi-select support
    pub fn select_edge(&mut self, edge_id: &str, multi_select: bool) {
        if multi_select {
            if !self.selected_edges.remove(edge_id) {
                self.selected_edges.insert(edge_id.to_string());
            }
        } else {
            self.selected_nodes.clear(); // Clear node selection when selecting an edge
            self.selected_edges.clear();
            self.selected_edges.insert(edge_id.to_string());
        }
    }

    /// Clear all selections
    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
    }

    /// Forget selected items that no longer exist in the graph
    pub fn prune(&mut self, graph: &FlowGraph) {
        self.selected_nodes.retain(|id| graph.node(id).is_some());
        self.selected_edges.retain(|id| graph.edge(id).is_some());
        self.drag_offsets.retain(|id, _| graph.node(id).is_some());
    }

    /// Start dragging the selected nodes from a grab point
    pub fn start_drag(&mut self, grab: Vec2, graph: &FlowGraph) {
        self.drag_offsets.clear();
        for node_id in &self.selected_nodes {
            if let Some(node) = graph.node(node_id) {
                self.drag_offsets.insert(node_id.clone(), node.position - grab);
            }
        }
    }

    /// Update node positions during drag
    pub fn update_drag(&mut self, pointer: Vec2, graph: &mut FlowGraph) {
        for (node_id, &offset) in &self.drag_offsets {
            if graph.move_node(node_id, pointer + offset) {
                self.moved = true;
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        !self.drag_offsets.is_empty()
    }

    /// Note a position change made outside a drag gesture
    pub fn mark_moved(&mut self) {
        self.moved = true;
    }

    /// Whether positions changed since the last settle
    pub fn has_unsettled_movement(&self) -> bool {
        self.moved
    }

    /// Reset the movement flag, returning its previous value
    pub fn take_movement(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }

    /// End dragging; returns whether anything moved since the last settle
    pub fn end_drag(&mut self) -> bool {
        self.drag_offsets.clear();
        self.take_movement()
    }

    /// Remove selected edges, then selected nodes with their edges
    pub fn delete_selected(&mut self, graph: &mut FlowGraph) -> bool {
        let mut changed = false;
        for edge_id in self.selected_edges.drain() {
            changed |= graph.remove_edge(&edge_id);
        }
        for node_id in self.selected_nodes.drain() {
            changed |= graph.remove_node(&node_id);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Shape;

    #[test]
    fn test_select_and_toggle() {
        let mut interaction = InteractionManager::new();
        interaction.select_node("a", false);
        interaction.select_node("b", true);
        assert_eq!(interaction.selected_nodes.len(), 2);
        interaction.select_node("a", true);
        assert!(!interaction.selected_nodes.contains("a"));
        interaction.select_edge("e", false);
        assert!(interaction.selected_nodes.is_empty());
        assert!(interaction.selected_edges.contains("e"));
    }

    #[test]
    fn test_drag_moves_selection_together() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(Shape::Rectangle, Vec2::new(0.0, 0.0));
        let b = graph.create_node(Shape::Circle, Vec2::new(100.0, 0.0));
        let mut interaction = InteractionManager::new();
        interaction.select_node(&a.id, false);
        interaction.select_node(&b.id, true);

        interaction.start_drag(Vec2::new(10.0, 10.0), &graph);
        interaction.update_drag(Vec2::new(20.0, 30.0), &mut graph);
        assert!(interaction.is_dragging());

        assert_eq!(graph.node(&a.id).unwrap().position, Vec2::new(10.0, 20.0));
        assert_eq!(graph.node(&b.id).unwrap().position, Vec2::new(110.0, 20.0));
        assert!(interaction.end_drag());
        assert!(!interaction.end_drag());
    }

    #[test]
    fn test_prune_drops_missing_items() {
        let mut graph = FlowGraph::new();
        let a = graph.create_node(Shape::Rectangle, Vec2::ZERO);
        let mut interaction = InteractionManager::new();
        interaction.select_node(&a.id, false);
        interaction.select_node("ghost", true);
        interaction.prune(&graph);
        assert_eq!(interaction.selected_nodes.len(), 1);
    }
}
