//! Error types for the flow editor
//!
//! Every error here is recoverable: callers log it and fall back to a safe
//! default instead of surfacing a hard failure.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised by the graph model, persistence and configuration layers
#[derive(Error, Debug)]
pub enum FlowError {
    /// Shape tag that is not part of the shape registry
    #[error("Unknown shape: {0}")]
    UnknownShape(String),

    /// Persisted graph could not be parsed
    #[error("Corrupt persisted state: {0}")]
    CorruptState(#[from] serde_json::Error),

    /// An edge or handle refers to a node or connection point that does not exist
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    /// A handle was used in the wrong direction
    #[error("Handle {handle} is not a {expected} handle")]
    HandleRole {
        handle: String,
        expected: &'static str,
    },

    /// Storage slot could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration file is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    /// Whether the error came from unreadable persisted data
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, FlowError::CorruptState(_))
    }
}
