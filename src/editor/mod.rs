//! Flow editor session
//!
//! `FlowEditor` owns the live graph together with its history, persistence
//! and selection state. Every discrete mutation is committed: the new state is
//! recorded in history and written to the storage slot. Drag movement updates
//! the live graph immediately but is committed only once the gesture settles.

// Module declarations
pub mod events;
pub mod history;
pub mod interaction;
pub mod persistence;

// Re-exports
pub use events::{GraphIntent, MutationBus, Subscription};
pub use history::{GraphSnapshot, History};
pub use interaction::InteractionManager;
pub use persistence::{FileSlot, MemorySlot, PersistenceAdapter, StorageSlot};

use crate::config::EditorConfig;
use crate::error::{FlowError, Result};
use crate::nodes::{Edge, FlowGraph, Node, NodeFields, Shape};
use glam::Vec2;
use log::{debug, error, info, warn};

/// Editing session over one persisted flow graph
#[derive(Debug)]
pub struct FlowEditor<S: StorageSlot> {
    graph: FlowGraph,
    history: History,
    persistence: PersistenceAdapter<S>,
    interaction: InteractionManager,
    subscription: Option<Subscription>,
    autosave: bool,
}

impl<S: StorageSlot> FlowEditor<S> {
    /// Open a session, hydrating the graph from the slot.
    ///
    /// A corrupt slot is discarded and the session starts empty.
    pub fn open(config: &EditorConfig, slot: S) -> Self {
        let mut editor = Self {
            graph: FlowGraph::with_color_policy(config.color_policy),
            history: History::new(),
            persistence: PersistenceAdapter::new(slot),
            interaction: InteractionManager::new(),
            subscription: None,
            autosave: config.autosave,
        };
        editor.hydrate();
        editor
    }

    fn hydrate(&mut self) {
        match self.persistence.load() {
            Ok(Some((nodes, edges))) => {
                info!("Loaded {} node(s) and {} edge(s)", nodes.len(), edges.len());
                self.graph.replace(nodes, edges);
                self.history.record(GraphSnapshot::capture(&self.graph));
            }
            Ok(None) => info!("No saved flow, starting empty"),
            Err(e @ FlowError::CorruptState(_)) => {
                warn!("{}; discarding saved flow", e);
                if let Err(e) = self.persistence.discard() {
                    error!("Failed to discard saved flow: {}", e);
                }
            }
            Err(e) => warn!("Could not read saved flow, starting empty: {}", e),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.node(id)
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Record the live graph and persist it if it changed
    fn commit(&mut self) -> bool {
        self.interaction.take_movement();
        self.interaction.prune(&self.graph);
        let recorded = self.history.record(GraphSnapshot::capture(&self.graph));
        if recorded && self.autosave {
            self.persist();
        }
        recorded
    }

    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(self.graph.nodes(), self.graph.edges()) {
            error!("Failed to save flow: {}", e);
        }
    }

    /// Write the live graph to the slot regardless of autosave
    pub fn save_now(&mut self) -> Result<()> {
        self.persistence.save(self.graph.nodes(), self.graph.edges())
    }

    pub fn create_node(&mut self, shape: Shape, position: Vec2) -> Node {
        let node = self.graph.create_node(shape, position);
        self.commit();
        node
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        let removed = self.graph.remove_node(id);
        if removed {
            self.commit();
        }
        removed
    }

    pub fn change_shape(&mut self, id: &str, shape: Shape) -> bool {
        let changed = self.graph.change_shape(id, shape);
        if changed {
            self.commit();
        }
        changed
    }

    pub fn update_node_fields(&mut self, id: &str, fields: &NodeFields) -> bool {
        let updated = self.graph.update_node_fields(id, fields);
        if updated {
            self.commit();
        }
        updated
    }

    /// Connect gesture from the render layer
    pub fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Result<Edge> {
        let edge = self.graph.connect(source, source_handle, target, target_handle)?;
        self.commit();
        Ok(edge)
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let removed = self.graph.remove_edge(id);
        if removed {
            self.commit();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.commit();
    }

    /// Move a node without recording history; the move settles later
    pub fn move_node(&mut self, id: &str, position: Vec2) -> bool {
        let moved = self.graph.move_node(id, position);
        if moved {
            self.interaction.mark_moved();
        }
        moved
    }

    /// Start dragging from `grab`, selecting the node if it is not already selected
    pub fn begin_drag(&mut self, node_id: &str, grab: Vec2) {
        if self.graph.node(node_id).is_none() {
            return;
        }
        if !self.interaction.selected_nodes.contains(node_id) {
            self.interaction.select_node(node_id, false);
        }
        self.interaction.start_drag(grab, &self.graph);
    }

    pub fn drag_to(&mut self, pointer: Vec2) {
        self.interaction.update_drag(pointer, &mut self.graph);
    }

    /// Finish a drag gesture, committing the movement as one history entry
    pub fn end_drag(&mut self) -> bool {
        if self.interaction.end_drag() {
            self.commit()
        } else {
            false
        }
    }

    /// The gesture was cut short (focus loss, tab switch).
    ///
    /// Pending movement settles where it stopped.
    pub fn interrupt(&mut self) -> bool {
        if self.interaction.has_unsettled_movement() {
            debug!("Drag interrupted, settling movement");
        }
        self.end_drag()
    }

    pub fn undo(&mut self) -> bool {
        self.end_drag();
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.end_drag();
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        let (nodes, edges) = snapshot.into_parts();
        self.graph.replace(nodes, edges);
        self.interaction.prune(&self.graph);
        debug!("Restored history entry {}", self.history.cursor());
        if self.autosave {
            self.persist();
        }
    }

    pub fn select_node(&mut self, id: &str, multi_select: bool) {
        if self.graph.node(id).is_some() {
            self.interaction.select_node(id, multi_select);
        }
    }

    pub fn select_edge(&mut self, id: &str, multi_select: bool) {
        if self.graph.edge(id).is_some() {
            self.interaction.select_edge(id, multi_select);
        }
    }

    pub fn clear_selection(&mut self) {
        self.interaction.clear_selection();
    }

    /// Delete every selected node and edge as one step
    pub fn delete_selection(&mut self) -> bool {
        let changed = self.interaction.delete_selected(&mut self.graph);
        if changed {
            self.commit();
        }
        changed
    }

    /// Subscribe to a mutation bus, replacing any earlier subscription
    pub fn attach(&mut self, bus: &MutationBus) {
        self.subscription = Some(bus.subscribe());
    }

    /// End the bus subscription
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    /// Apply pending bus intents in dispatch order; returns how many changed the graph
    pub fn pump_intents(&mut self) -> usize {
        let intents = match &self.subscription {
            Some(subscription) => subscription.drain(),
            None => return 0,
        };
        intents
            .into_iter()
            .filter(|intent| self.apply_intent(intent))
            .count()
    }

    /// Apply a single intent
    pub fn apply_intent(&mut self, intent: &GraphIntent) -> bool {
        let applied = match intent {
            GraphIntent::DeleteNode { node_id } => self.remove_node(node_id),
            GraphIntent::ChangeNodeShape { node_id, new_shape } => self.change_shape(node_id, *new_shape),
            GraphIntent::UpdateNodeData { node_id, fields } => self.update_node_fields(node_id, fields),
        };
        if !applied {
            debug!("Intent for node {} had no effect", intent.node_id());
        }
        applied
    }
}
