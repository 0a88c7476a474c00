//! Segmenter - brush and GrabCut segmentation mask editing
//!
//! The core of a mask editor: a four-channel raster mask painted with a round
//! brush, bounded undo/redo, GrabCut refinement on a background worker, a
//! zoom/pan viewport, and per-category label files next to the images.
//!
//! Rendering and windowing are left to the embedding shell, which feeds
//! [`PointerEvent`]s in and draws [`EditorSession::overlay`] on top of the image.

pub mod constants;
pub mod config;
pub mod error;
pub mod format;
pub mod input;
pub mod logging;
pub mod mask;
pub mod model;
pub mod paint;
pub mod project;
pub mod segmentation;
pub mod session;
pub mod undo;
pub mod viewport;
pub mod workspace;
pub mod zoom_math;

pub use config::{AppConfig, ConfigError, LogLevel};
pub use error::{MissingClass, Result, SegmenterError};
pub use input::{PointerButton, PointerEffect, PointerEvent, handle_pointer};
pub use mask::{Channel, ColorMap, RasterMask};
pub use model::{CategorySelector, LabelCategory};
pub use paint::{ImagePoint, PaintEngine, PaintMode};
pub use project::ProjectState;
pub use segmentation::{CancelToken, LabelMap, SegLabel, SegmentationRefiner};
pub use session::EditorSession;
pub use undo::HistoryStack;
pub use viewport::ViewportController;
pub use workspace::{NavigationOutcome, UnsavedChoice, Workspace};
