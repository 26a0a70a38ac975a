//! Persistence for the flow editor
//!
//! Handles saving the graph to a single local storage slot and loading it back,
//! normalizing data written by older versions so every loaded node satisfies
//! the graph invariants.

use crate::constants::{edge, handle, palette, storage};
use crate::error::{FlowError, Result};
use crate::nodes::node::{default_label, vec2_serde};
use crate::nodes::{ConnectionPoint, Edge, HandleRole, Node, Shape, Side};
use glam::Vec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A durable slot holding one serialized graph
pub trait StorageSlot {
    /// Read the slot; `None` when nothing has been written yet
    fn read(&self) -> Result<Option<String>>;

    /// Overwrite the slot
    fn write(&mut self, contents: &str) -> Result<()>;

    /// Remove the slot's contents
    fn clear(&mut self) -> Result<()>;
}

/// Slot backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot named `key` inside `dir`
    pub fn in_dir(dir: &Path, key: &str) -> Self {
        Self::new(dir.join(format!("{}.{}", key, storage::EXTENSION)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageSlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory slot; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw contents
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// Current raw contents
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }

    fn set(&self, value: Option<String>) -> Result<()> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| std::io::Error::other("memory slot poisoned"))?;
        *guard = value;
        Ok(())
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.set(Some(contents.to_string()))
    }

    fn clear(&mut self) -> Result<()> {
        self.set(None)
    }
}

/// Saved graph layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SaveData {
    #[serde(default)]
    nodes: Vec<SavedNode>,
    #[serde(default)]
    edges: Vec<SavedEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedNode {
    id: String,
    #[serde(with = "vec2_serde", default)]
    position: Vec2,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: SavedNodeData,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedNodeData {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    node_category: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    custom_handles: Vec<SavedHandle>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedHandle {
    #[serde(rename = "type")]
    role: String,
    position: String,
    id: String,
    #[serde(default)]
    style: SavedHandleStyle,
}

/// Older saves carry CSS-like handle styles; anything but `offset` is ignored
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct SavedHandleStyle {
    offset: f32,
}

impl Default for SavedHandleStyle {
    fn default() -> Self {
        Self { offset: handle::CENTER }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedEdge {
    id: String,
    source: String,
    target: String,
    #[serde(default)]
    source_handle: Option<String>,
    #[serde(default)]
    target_handle: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    animated: bool,
    #[serde(default)]
    style: Option<SavedEdgeStyle>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SavedEdgeStyle {
    stroke: String,
    stroke_width: f32,
}

impl Default for SavedEdgeStyle {
    fn default() -> Self {
        Self {
            stroke: edge::STROKE.to_string(),
            stroke_width: edge::STROKE_WIDTH,
        }
    }
}

fn parse_role(tag: &str) -> Option<HandleRole> {
    match tag {
        "source" => Some(HandleRole::Source),
        "target" => Some(HandleRole::Target),
        _ => None,
    }
}

fn side_tag(side: Side) -> &'static str {
    match side {
        Side::Top => "top",
        Side::Right => "right",
        Side::Bottom => "bottom",
        Side::Left => "left",
    }
}

fn parse_side(tag: &str) -> Option<Side> {
    match tag {
        "top" => Some(Side::Top),
        "right" => Some(Side::Right),
        "bottom" => Some(Side::Bottom),
        "left" => Some(Side::Left),
        _ => None,
    }
}

impl From<&Node> for SavedNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            position: node.position,
            kind: Some(node.shape.tag().to_string()),
            data: SavedNodeData {
                label: Some(node.label.clone()),
                node_category: Some(node.shape.tag().to_string()),
                color: Some(node.color.clone()),
                content: Some(node.content.clone()),
                custom_handles: node
                    .connection_points
                    .iter()
                    .map(|p| SavedHandle {
                        role: p.role.name().to_string(),
                        position: side_tag(p.side).to_string(),
                        id: p.id.clone(),
                        style: SavedHandleStyle { offset: p.offset },
                    })
                    .collect(),
            },
        }
    }
}

impl From<&Edge> for SavedEdge {
    fn from(e: &Edge) -> Self {
        Self {
            id: e.id.clone(),
            source: e.source.clone(),
            target: e.target.clone(),
            source_handle: Some(e.source_handle.clone()),
            target_handle: Some(e.target_handle.clone()),
            kind: Some(e.style.kind.clone()),
            animated: e.style.animated,
            style: Some(SavedEdgeStyle {
                stroke: e.style.stroke.clone(),
                stroke_width: e.style.stroke_width,
            }),
        }
    }
}

/// Serialize a graph to the saved layout
pub fn encode(nodes: &[Node], edges: &[Edge]) -> Result<String> {
    let data = SaveData {
        nodes: nodes.iter().map(SavedNode::from).collect(),
        edges: edges.iter().map(SavedEdge::from).collect(),
    };
    Ok(serde_json::to_string(&data)?)
}

/// Parse and normalize a saved graph
pub fn decode(text: &str) -> Result<(Vec<Node>, Vec<Edge>)> {
    let data: SaveData = serde_json::from_str(text)?;

    let mut nodes: Vec<Node> = Vec::with_capacity(data.nodes.len());
    for saved in data.nodes {
        if nodes.iter().any(|n| n.id == saved.id) {
            warn!("Skipping duplicate node id {}", saved.id);
            continue;
        }
        let node = normalize_node(saved, &nodes);
        nodes.push(node);
    }

    let edges = data
        .edges
        .into_iter()
        .filter_map(|saved| normalize_edge(saved, &nodes))
        .collect();

    Ok((nodes, edges))
}

fn resolve_shape(saved: &SavedNode) -> (Shape, bool) {
    let tags = [saved.data.node_category.as_deref(), saved.kind.as_deref()];
    for tag in tags.into_iter().flatten() {
        if let Ok(shape) = tag.parse::<Shape>() {
            return (shape, true);
        }
    }
    warn!(
        "{} for node {}, falling back to rectangle",
        FlowError::UnknownShape(format!("{:?}", tags)),
        saved.id
    );
    (Shape::Rectangle, false)
}

fn normalize_node(saved: SavedNode, loaded: &[Node]) -> Node {
    let (shape, known) = resolve_shape(&saved);

    let points: Vec<ConnectionPoint> = saved
        .data
        .custom_handles
        .iter()
        .filter_map(|h| {
            let role = parse_role(&h.role)?;
            let side = parse_side(&h.position)?;
            Some(ConnectionPoint::new(h.id.clone(), role, side, h.style.offset))
        })
        .collect();

    let label = saved.data.label.filter(|l| !l.trim().is_empty()).unwrap_or_else(|| {
        default_label(shape, loaded.iter().filter(|n| n.shape == shape).count() + 1)
    });

    let mut node = Node::new(
        saved.id,
        shape,
        saved.position,
        label,
        saved.data.color.unwrap_or_else(|| palette::PRIMARY.to_string()),
    );
    node.content = saved.data.content.unwrap_or_default();

    if known && !points.is_empty() {
        node.connection_points = points;
        if !node.has_unique_handles() {
            warn!("Node {} has duplicate handle ids, regenerating", node.id);
            node.connection_points = shape.default_connection_points(&node.id);
        }
    } else {
        debug!("Regenerated connection points for node {}", node.id);
    }
    node
}

fn resolve_handle(node: &Node, handle: Option<String>, role: HandleRole) -> Option<String> {
    match handle {
        Some(id) if node.has_handle(&id, role) => Some(id),
        Some(_) => None,
        // Older saves allowed edges without handles; use the node's first handle of the role
        None => node
            .connection_points
            .iter()
            .find(|p| p.role == role)
            .map(|p| p.id.clone()),
    }
}

fn normalize_edge(saved: SavedEdge, nodes: &[Node]) -> Option<Edge> {
    let dangling = |what: String| {
        warn!("Dropping edge {}: {}", saved.id, FlowError::DanglingReference(what));
    };
    let Some(source) = nodes.iter().find(|n| n.id == saved.source) else {
        dangling(format!("source node {}", saved.source));
        return None;
    };
    let Some(target) = nodes.iter().find(|n| n.id == saved.target) else {
        dangling(format!("target node {}", saved.target));
        return None;
    };
    let Some(source_handle) = resolve_handle(source, saved.source_handle.clone(), HandleRole::Source)
    else {
        dangling(format!("source handle on {}", source.id));
        return None;
    };
    let Some(target_handle) = resolve_handle(target, saved.target_handle.clone(), HandleRole::Target)
    else {
        dangling(format!("target handle on {}", target.id));
        return None;
    };
    if saved.kind.as_deref().is_some_and(|k| k != edge::KIND) {
        debug!("Edge {} restyled to {}", saved.id, edge::KIND);
    }
    Some(Edge::new(saved.id, &source.id, source_handle, &target.id, target_handle))
}

/// Saves and loads the graph through a storage slot
#[derive(Debug)]
pub struct PersistenceAdapter<S: StorageSlot> {
    slot: S,
}

impl<S: StorageSlot> PersistenceAdapter<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Overwrite the slot with the given graph
    pub fn save(&mut self, nodes: &[Node], edges: &[Edge]) -> Result<()> {
        let json = encode(nodes, edges)?;
        self.slot.write(&json)?;
        debug!("Saved {} node(s), {} edge(s)", nodes.len(), edges.len());
        Ok(())
    }

    /// Load the slot; `Ok(None)` when it is empty
    pub fn load(&self) -> Result<Option<(Vec<Node>, Vec<Edge>)>> {
        match self.slot.read()? {
            Some(text) if !text.trim().is_empty() => decode(&text).map(Some),
            _ => Ok(None),
        }
    }

    /// Drop whatever the slot holds
    pub fn discard(&mut self) -> Result<()> {
        self.slot.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{EdgeStyle, FlowGraph, NodeFields};

    fn sample_graph() -> FlowGraph {
        let mut graph = FlowGraph::new();
        let rect = graph.create_node(Shape::Rectangle, Vec2::new(0.0, 0.0));
        let circle = graph.create_node(Shape::Circle, Vec2::new(200.5, -40.25));
        graph.update_node_fields(
            &circle.id,
            &NodeFields {
                content: Some("*emphasis*".into()),
                ..NodeFields::color(palette::COLORS[2])
            },
        );
        graph
            .connect(
                &rect.id,
                &format!("{}-source-right", rect.id),
                &circle.id,
                &format!("{}-target-top-left", circle.id),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_save_load_round_trip() {
        let graph = sample_graph();
        let mut adapter = PersistenceAdapter::new(MemorySlot::new());
        adapter.save(graph.nodes(), graph.edges()).unwrap();

        let (nodes, edges) = adapter.load().unwrap().unwrap();
        assert_eq!(nodes, graph.nodes());
        assert_eq!(edges, graph.edges());
    }

    #[test]
    fn test_saved_layout_field_names() {
        let graph = sample_graph();
        let json: serde_json::Value =
            serde_json::from_str(&encode(graph.nodes(), graph.edges()).unwrap()).unwrap();

        let node = &json["nodes"][1];
        assert_eq!(node["type"], "circle");
        assert_eq!(node["data"]["nodeCategory"], "circle");
        assert_eq!(node["position"]["x"], 200.5);
        assert_eq!(node["data"]["customHandles"].as_array().unwrap().len(), 8);
        assert_eq!(node["data"]["customHandles"][0]["type"], "target");
        assert_eq!(node["data"]["customHandles"][0]["position"], "top");

        let edge = &json["edges"][0];
        assert_eq!(edge["type"], "bezier");
        assert_eq!(edge["animated"], true);
        assert_eq!(edge["style"]["strokeWidth"], 2.0);
        assert!(edge["sourceHandle"].as_str().unwrap().ends_with("-source-right"));
    }

    #[test]
    fn test_unknown_shape_normalized_to_rectangle() {
        let text = r##"{
            "nodes": [{
                "id": "old-1",
                "position": { "x": 10, "y": 20 },
                "type": "triangle",
                "data": { "label": "Tri", "nodeCategory": "triangle", "color": "#ef4444", "content": "" }
            }],
            "edges": []
        }"##;
        let (nodes, edges) = decode(text).unwrap();
        assert!(edges.is_empty());
        let node = &nodes[0];
        assert_eq!(node.shape, Shape::Rectangle);
        assert_eq!(node.label, "Tri");
        assert_eq!(node.position, Vec2::new(10.0, 20.0));
        assert_eq!(node.connection_points, Shape::Rectangle.default_connection_points("old-1"));
    }

    #[test]
    fn test_missing_handles_and_fields_are_filled() {
        let text = r#"{ "nodes": [
            { "id": "a", "position": { "x": 0, "y": 0 }, "type": "circle", "data": {} },
            { "id": "b", "position": { "x": 1, "y": 1 }, "type": "rectangle",
              "data": { "customHandles": [] } }
        ] }"#;
        let (nodes, _) = decode(text).unwrap();
        assert_eq!(nodes[0].connection_points.len(), 8);
        assert_eq!(nodes[0].label, "Circle 1");
        assert_eq!(nodes[0].color, palette::PRIMARY);
        assert_eq!(nodes[1].connection_points.len(), 2);
        assert_eq!(nodes[1].label, "Rectangle 1");
    }

    #[test]
    fn test_dangling_edges_dropped_on_load() {
        let text = r#"{
            "nodes": [{ "id": "a", "position": { "x": 0, "y": 0 }, "type": "rectangle", "data": {} }],
            "edges": [
                { "id": "e1", "source": "a", "target": "gone", "sourceHandle": "a-source-right", "targetHandle": "gone-target-left" },
                { "id": "e2", "source": "a", "target": "a", "sourceHandle": "a-source-right", "targetHandle": "a-missing" },
                { "id": "e3", "source": "a", "target": "a" }
            ]
        }"#;
        let (_, edges) = decode(text).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, "e3");
        assert_eq!(edges[0].source_handle, "a-source-right");
        assert_eq!(edges[0].target_handle, "a-target-left");
    }

    #[test]
    fn test_loose_handle_style_keeps_stored_handles() {
        let text = r#"{ "nodes": [{
            "id": "a", "position": { "x": 0, "y": 0 }, "type": "circle",
            "data": { "nodeCategory": "circle", "customHandles": [
                { "type": "target", "position": "top", "id": "a-t", "style": { "left": "30%" } },
                { "type": "source", "position": "bottom", "id": "a-s", "style": {} },
                { "type": "source", "position": "right", "id": "a-r", "style": { "offset": 0.7, "top": "70%" } }
            ] }
        }] }"#;
        let (nodes, _) = decode(text).unwrap();
        let points = &nodes[0].connection_points;
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].id, "a-t");
        assert_eq!(points[0].offset, handle::CENTER);
        assert_eq!(points[1].offset, handle::CENTER);
        assert_eq!(points[2].offset, handle::FAR);
    }

    #[test]
    fn test_partial_edge_style_gets_fixed_style() {
        let text = r##"{
            "nodes": [{ "id": "a", "position": { "x": 0, "y": 0 }, "type": "rectangle", "data": {} }],
            "edges": [
                { "id": "e1", "source": "a", "target": "a", "style": { "stroke": "#64748b" } },
                { "id": "e2", "source": "a", "target": "a", "type": "smoothstep",
                  "style": { "strokeDasharray": "5 5" } }
            ]
        }"##;
        let (_, edges) = decode(text).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.style == EdgeStyle::default()));
    }

    #[test]
    fn test_loose_styles_survive_adapter_load() {
        let text = r#"{
            "nodes": [{ "id": "a", "position": { "x": 0, "y": 0 }, "type": "rectangle", "data": {
                "customHandles": [
                    { "type": "source", "position": "right", "id": "a-out", "style": { "right": 0 } },
                    { "type": "target", "position": "left", "id": "a-in", "style": { "left": 0 } }
                ]
            } }],
            "edges": [{ "id": "e1", "source": "a", "target": "a", "sourceHandle": "a-out", "style": { "strokeWidth": 3 } }]
        }"#;
        let adapter = PersistenceAdapter::new(MemorySlot::with_contents(text));
        let (nodes, edges) = adapter.load().unwrap().unwrap();
        assert_eq!(nodes[0].connection_points[0].id, "a-out");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_handle, "a-in");
        assert_eq!(edges[0].style.stroke_width, edge::STROKE_WIDTH);
    }

    #[test]
    fn test_malformed_json_is_corrupt_state() {
        let adapter = PersistenceAdapter::new(MemorySlot::with_contents("{ nodes: ["));
        let err = adapter.load().unwrap_err();
        assert!(err.is_corrupt_state());
    }

    #[test]
    fn test_empty_slot_loads_nothing() {
        let adapter = PersistenceAdapter::new(MemorySlot::new());
        assert!(adapter.load().unwrap().is_none());
    }

    #[test]
    fn test_file_slot_round_trip() {
        let dir = std::env::temp_dir().join(format!("flowpad-test-{}", uuid::Uuid::new_v4()));
        let graph = sample_graph();
        let mut adapter = PersistenceAdapter::new(FileSlot::in_dir(&dir, "slot"));
        assert!(adapter.load().unwrap().is_none());

        adapter.save(graph.nodes(), graph.edges()).unwrap();
        let (nodes, edges) = adapter.load().unwrap().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);

        adapter.discard().unwrap();
        assert!(adapter.load().unwrap().is_none());
        std::fs::remove_dir_all(&dir).ok();
    }
}
