//! Data models for the segmenter.

mod category;

pub use category::{CategorySelector, LabelCategory, default_categories};
