//! Mask persistence and image discovery.
//!
//! ## Mask files
//!
//! Masks are stored as RGBA PNGs next to (or apart from) the images:
//!
//! | PNG channel | mask plane          |
//! |-------------|---------------------|
//! | R           | background          |
//! | G           | foreground          |
//! | B           | possible foreground |
//! | A           | coverage            |
//!
//! so the file renders red/green/blue over transparency in any viewer.
//!
//! ## Images
//!
//! Only PNG and JPEG images are listed, detected by content rather than by
//! extension.

mod error;
mod image_source;
mod mask_file;

pub use error::FormatError;
pub use image_source::{ImageKind, list_readable_image_paths, load_image, sniff_image_kind};
pub use mask_file::{
    export_mask, import_mask, load_mask_png, mask_from_rgba, mask_to_rgba, save_mask_png,
};
