//! Error types for mask editing, refinement and workspace operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::format::FormatError;

/// The seed class a refinement request is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingClass {
    /// No background or empty (possible background) pixels
    Background,
    /// No foreground or possible foreground pixels
    Foreground,
}

impl MissingClass {
    /// User-facing explanation of what needs to be painted.
    pub fn message(&self) -> &'static str {
        match self {
            MissingClass::Background => "You must select some background or empty area.",
            MissingClass::Foreground => "You must select some foreground or possible foreground.",
        }
    }
}

/// Errors returned by the segmenter core.
#[derive(Error, Debug)]
pub enum SegmenterError {
    /// Refinement requested without samples of both classes
    #[error("{}", .0.message())]
    InsufficientSeed(MissingClass),

    /// Navigation attempted while the mask has unsaved changes
    #[error("The segmentation has been modified and has unsaved changes")]
    UnsavedChanges,

    /// A regular file sits where a label directory must be created
    #[error("A file without an extension is blocking directory creation at {path:?}")]
    DirectoryCreationConflict {
        /// Path of the blocking file
        path: PathBuf,
    },

    /// A mask-mutating operation was attempted while a refinement is running
    #[error("Editing is locked while a refinement is in progress")]
    EditingLocked,

    /// The operation needs a loaded image
    #[error("No image is loaded")]
    NoImageLoaded,

    /// A mask or image with a zero-sized side
    #[error("Invalid mask dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Image and mask sizes differ
    #[error("Image is {image_width}x{image_height} but mask is {mask_width}x{mask_height}")]
    SizeMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    /// Image index outside the scanned image list
    #[error("Image index {index} out of range (have {count} images)")]
    ImageIndexOutOfRange {
        /// Requested zero-based index
        index: usize,
        /// Number of images available
        count: usize,
    },

    /// Category name not among the configured categories
    #[error("Unknown label category '{0}'")]
    UnknownCategory(String),

    /// Skip-to-next search found no image in the wanted state
    #[error("No {wanted} images found for label type '{category}'")]
    NoMatchingImage {
        /// "labeled" or "unlabeled"
        wanted: &'static str,
        /// Category that was searched
        category: String,
    },

    /// No image directory has been opened yet
    #[error("No image directory is open")]
    NoImageDirectory,

    /// A refinement was cancelled before it finished
    #[error("Refinement cancelled")]
    Cancelled,

    /// The refinement worker thread is gone
    #[error("Refinement worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// Mask or image file error
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error outside of mask files (directory scans, directory creation)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for segmenter operations.
pub type Result<T> = std::result::Result<T, SegmenterError>;
