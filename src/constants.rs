//! Global constants for the segmenter

/// Number of snapshots kept in each of the undo and redo stacks
pub const HISTORY_CAPACITY: usize = 10;

/// Default brush radius in image pixels (an 8 px wide pen)
pub const DEFAULT_BRUSH_RADIUS: f32 = 4.0;

/// Smallest brush radius accepted by the paint engine
pub const MIN_BRUSH_RADIUS: f32 = 0.5;

/// Largest brush radius accepted by the paint engine
pub const MAX_BRUSH_RADIUS: f32 = 50.0;

/// Default mask overlay opacity (0.0 - 1.0)
pub const DEFAULT_MASK_OPACITY: f32 = 0.5;

/// GrabCut iterations per refinement request.
/// Kept small so a refinement stays interactive.
pub const DEFAULT_REFINE_ITERATIONS: usize = 2;

/// Suffix appended to an image stem to form its mask filename
pub const LABEL_FILE_SUFFIX: &str = "_label.png";

/// Category names offered when no configuration overrides them
pub const DEFAULT_CATEGORIES: &[&str] = &["Foot", "Inner Wound", "Outer Wound"];

/// Zoom constants for the viewport
pub mod zoom {
    /// Scale factor applied per zoom-in step
    pub const IN_FACTOR: f32 = 1.25;
    /// Scale factor applied per zoom-out step
    pub const OUT_FACTOR: f32 = 0.8;
}
