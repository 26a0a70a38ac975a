//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// Name used for config and data directories
pub const APP_NAME: &str = "flowpad";

/// Node colour palette
pub mod palette {
    /// Selectable node colours, primary entry first
    pub const COLORS: [&str; 8] = [
        "#3b82f6", // Blue
        "#10b981", // Green
        "#f59e0b", // Amber
        "#ef4444", // Red
        "#8b5cf6", // Violet
        "#ec4899", // Pink
        "#14b8a6", // Teal
        "#64748b", // Slate
    ];

    /// Colour assigned when no other policy applies
    pub const PRIMARY: &str = COLORS[0];

    /// Check whether a colour belongs to the palette (case-insensitive)
    pub fn contains(color: &str) -> bool {
        COLORS.iter().any(|c| c.eq_ignore_ascii_case(color))
    }
}

/// Fixed visual contract shared by every edge
pub mod edge {
    /// Curve kind understood by the render layer
    pub const KIND: &str = "bezier";

    /// Edges are always drawn animated
    pub const ANIMATED: bool = true;

    /// Stroke colour
    pub const STROKE: &str = "#64748b";

    /// Stroke width in pixels
    pub const STROKE_WIDTH: f32 = 2.0;
}

/// Connection point layout constants
pub mod handle {
    /// Offset of a lone handle along its side
    pub const CENTER: f32 = 0.5;

    /// Offset of the first of a pair of handles along a side
    pub const NEAR: f32 = 0.3;

    /// Offset of the second of a pair of handles along a side
    pub const FAR: f32 = 0.7;
}

/// Persistence constants
pub mod storage {
    /// Default name of the local storage slot
    pub const DEFAULT_KEY: &str = "flowchart-data";

    /// File extension used by file-backed slots
    pub const EXTENSION: &str = "json";
}
