//! Error types for mask and image file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing masks and images.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Raw mask buffer does not hold `width * height * 4` bytes
    #[error("Mask buffer has {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        /// Required byte count
        expected: usize,
        /// Byte count received
        actual: usize,
    },

    /// Mask file size differs from the image it belongs to
    #[error("Mask {path:?} is {found_width}x{found_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        /// Mask file
        path: PathBuf,
        /// Width of the image
        expected_width: u32,
        /// Height of the image
        expected_height: u32,
        /// Width stored in the file
        found_width: u32,
        /// Height stored in the file
        found_height: u32,
    },

    /// File content is neither PNG nor JPEG
    #[error("Unsupported image content: {path:?}")]
    UnsupportedImage {
        /// Offending file
        path: PathBuf,
    },
}
