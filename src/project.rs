//! Image directory state and label file layout.
//!
//! Masks live under the label directory, one folder per category:
//!
//! ```text
//! <label_dir>/<category folder>/<image stem>_label.png
//! ```
//!
//! The label directory defaults to the image directory.

use std::path::{Path, PathBuf};

use crate::constants::LABEL_FILE_SUFFIX;
use crate::error::{Result, SegmenterError};
use crate::format::list_readable_image_paths;
use crate::model::LabelCategory;

/// Create `path` (and parents) unless it already exists as a directory.
///
/// A regular file at `path` or at any parent component is an error and is
/// left untouched.
pub fn ensure_dir(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }
    let mut components: Vec<&Path> = path
        .ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    components.reverse();
    if let Some(blocker) = components.into_iter().find(|p| p.exists() && !p.is_dir()) {
        return Err(SegmenterError::DirectoryCreationConflict {
            path: blocker.to_path_buf(),
        });
    }
    std::fs::create_dir_all(path)?;
    log::debug!("Created directory {:?}", path);
    Ok(path.to_path_buf())
}

/// Mask path for `image` inside a category folder.
pub fn label_path_in(category_dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    category_dir.join(format!("{}{}", stem, LABEL_FILE_SUFFIX))
}

/// State for an opened image directory.
#[derive(Clone, Debug)]
pub struct ProjectState {
    /// Directory the images were scanned from
    pub image_dir: PathBuf,
    /// Explicit label directory, if one was chosen
    label_dir: Option<PathBuf>,
    /// Sorted image files
    pub images: Vec<PathBuf>,
    /// Current image index
    pub current_index: usize,
}

impl ProjectState {
    /// Scan `image_dir` for PNG and JPEG images.
    pub fn from_folder(image_dir: PathBuf) -> Result<Self> {
        let images = list_readable_image_paths(&image_dir)?;
        Ok(Self::from_images(image_dir, images))
    }

    /// Build from an already-scanned image list.
    pub fn from_images(image_dir: PathBuf, images: Vec<PathBuf>) -> Self {
        Self {
            image_dir,
            label_dir: None,
            images,
            current_index: 0,
        }
    }

    /// Directory holding the category folders.
    pub fn label_root(&self) -> &Path {
        self.label_dir.as_deref().unwrap_or(&self.image_dir)
    }

    /// The explicitly chosen label directory.
    pub fn label_dir(&self) -> Option<&Path> {
        self.label_dir.as_deref()
    }

    /// Choose a separate label directory.
    pub fn set_label_dir(&mut self, dir: PathBuf) {
        self.label_dir = Some(dir);
    }

    /// Folder for a category's masks (not created).
    pub fn category_dir(&self, category: &LabelCategory) -> PathBuf {
        self.label_root().join(category.folder_name())
    }

    /// Mask path of the image at `index` for `category`.
    pub fn label_path(&self, index: usize, category: &LabelCategory) -> Option<PathBuf> {
        let image = self.images.get(index)?;
        Some(label_path_in(&self.category_dir(category), image))
    }

    /// Check if the image at `index` has a mask for `category`.
    pub fn is_labeled(&self, index: usize, category: &LabelCategory) -> bool {
        self.label_path(index, category)
            .is_some_and(|path| path.is_file())
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the directory had no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Get the current image path.
    pub fn current_image(&self) -> Option<&PathBuf> {
        self.images.get(self.current_index)
    }

    /// Current image name without extension, for display.
    pub fn current_name(&self) -> String {
        self.current_image()
            .and_then(|path| path.file_stem())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Index after the current one, if any. Navigation does not wrap.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.current_index + 1;
        (next < self.images.len()).then_some(next)
    }

    /// Index before the current one, if any.
    pub fn previous_index(&self) -> Option<usize> {
        self.current_index.checked_sub(1)
    }

    /// First index after the current one whose labeled state is `labeled`.
    pub fn find_after_current(&self, category: &LabelCategory, labeled: bool) -> Option<usize> {
        (self.current_index + 1..self.images.len()).find(|&i| self.is_labeled(i, category) == labeled)
    }

    /// Get progress string like "3/15".
    pub fn progress(&self) -> String {
        format!("{}/{}", self.current_index + 1, self.images.len())
    }
}
