//! Snapshot-based undo/redo history
//!
//! Every externally visible graph state is stored whole. Undo and redo move a
//! cursor over the stored snapshots and hand back owned copies, so the live
//! graph never aliases a history entry.

use crate::nodes::{Edge, FlowGraph, Node};
use log::debug;

/// Frozen copy of the whole graph at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Deep-copy the current state of a graph
    pub fn capture(graph: &FlowGraph) -> Self {
        Self::new(graph.nodes().to_vec(), graph.edges().to_vec())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

/// Undo/redo stack: `entries[0]` is the empty graph, `cursor` the displayed state
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<GraphSnapshot>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: vec![GraphSnapshot::default()],
            cursor: 0,
        }
    }

    /// Record a new state; returns false when it equals the current entry
    pub fn record(&mut self, snapshot: GraphSnapshot) -> bool {
        if self.entries[self.cursor] == snapshot {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;
        debug!("History entry {} recorded", self.cursor);
        true
    }

    /// Step back one entry
    pub fn undo(&mut self) -> Option<GraphSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward one entry
    pub fn redo(&mut self) -> Option<GraphSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &GraphSnapshot {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
