//! Label categories and the category selector.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CATEGORIES;
use crate::error::{Result, SegmenterError};

/// A label category. Each category keeps its masks in its own folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCategory {
    /// Display name of the category
    pub name: String,
}

impl LabelCategory {
    /// Create a category with the given display name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Folder holding this category's masks: the name with spaces replaced by `_`.
    pub fn folder_name(&self) -> String {
        self.name.replace(' ', "_")
    }
}

/// Built-in category list.
pub fn default_categories() -> Vec<LabelCategory> {
    DEFAULT_CATEGORIES.iter().map(|name| LabelCategory::new(name)).collect()
}

/// The active category out of a fixed list, remembering the previous one so
/// a cancelled switch can be undone.
#[derive(Debug, Clone)]
pub struct CategorySelector {
    categories: Vec<LabelCategory>,
    current: usize,
    previous: usize,
}

impl CategorySelector {
    /// Selector over `categories`, starting at the first. An empty list falls
    /// back to the built-in categories.
    pub fn new(categories: Vec<LabelCategory>) -> Self {
        let categories = if categories.is_empty() {
            default_categories()
        } else {
            categories
        };
        Self {
            categories,
            current: 0,
            previous: 0,
        }
    }

    /// All categories in display order.
    pub fn categories(&self) -> &[LabelCategory] {
        &self.categories
    }

    /// The active category.
    pub fn current(&self) -> &LabelCategory {
        &self.categories[self.current]
    }

    /// The category that was active before the last selection.
    pub fn previous(&self) -> &LabelCategory {
        &self.categories[self.previous]
    }

    /// Make `name` the active category. Returns whether the selection changed.
    pub fn select(&mut self, name: &str) -> Result<bool> {
        let index = self
            .categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SegmenterError::UnknownCategory(name.to_string()))?;
        if index == self.current {
            return Ok(false);
        }
        self.previous = self.current;
        self.current = index;
        log::debug!("🏷️ Category: {}", self.current().name);
        Ok(true)
    }

    /// Restore the category active before the last selection.
    pub fn revert(&mut self) {
        log::debug!(
            "🏷️ Category reverted: {} -> {}",
            self.current().name,
            self.previous().name
        );
        self.current = self.previous;
    }
}

impl Default for CategorySelector {
    fn default() -> Self {
        Self::new(default_categories())
    }
}
