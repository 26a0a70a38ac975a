//! Flowpad core library
//!
//! Flow diagram editing engine: shaped nodes and edges, snapshot undo/redo,
//! a typed mutation bus for node widgets, and local slot persistence. Rendering
//! is left to the host; it reads `nodes()`/`edges()` and reports user intents.

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod nodes;

// Re-export commonly used types
pub use config::{ColorPolicy, EditorConfig};
pub use editor::{FlowEditor, GraphIntent, MutationBus};
pub use error::{FlowError, Result};
pub use nodes::{Edge, FlowGraph, Node, NodeFields, Shape};
