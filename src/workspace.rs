//! Image/label directories, category selection and navigation.
//!
//! Every operation that would replace the current mask first applies the
//! unsaved-changes policy: when the mask is dirty the caller must pass an
//! [`UnsavedChoice`], otherwise the operation fails with
//! [`SegmenterError::UnsavedChanges`] and nothing changes. The shell asks the
//! user and retries with the answer.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{Result, SegmenterError};
use crate::format::{load_image, load_mask_png, save_mask_png};
use crate::model::{CategorySelector, LabelCategory};
use crate::project::{ProjectState, ensure_dir};
use crate::session::EditorSession;

/// Answer to "the mask has unsaved changes".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    /// Save the mask, then continue
    Save,
    /// Drop the changes and continue
    Discard,
    /// Abort the operation
    Cancel,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The image at this index is now shown
    Loaded(usize),
    /// The mask for the newly selected category is now shown
    CategoryChanged,
    /// The user cancelled; everything is as before
    Cancelled,
    /// Nothing to do (already there, or no image in that direction)
    Unchanged,
}

/// The editor's file-level state around an [`EditorSession`].
pub struct Workspace {
    session: EditorSession,
    project: Option<ProjectState>,
    categories: CategorySelector,
    config: AppConfig,
}

impl Workspace {
    /// Create a workspace from configuration. Nothing is opened yet.
    pub fn new(config: AppConfig, view_width: f32, view_height: f32) -> Self {
        let mut session = EditorSession::new(view_width, view_height);
        session.set_brush_radius(config.preferences.brush_radius);
        session.set_opacity(config.preferences.mask_opacity);
        session.set_refine_iterations(config.preferences.refine_iterations);
        let categories = CategorySelector::new(config.categories.clone());
        Self {
            session,
            project: None,
            categories,
            config,
        }
    }

    /// The editing session.
    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Mutable access to the editing session.
    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    /// The opened image directory.
    pub fn project(&self) -> Option<&ProjectState> {
        self.project.as_ref()
    }

    /// The category selector.
    pub fn categories(&self) -> &CategorySelector {
        &self.categories
    }

    /// The active category.
    pub fn current_category(&self) -> &LabelCategory {
        self.categories.current()
    }

    /// Configuration reflecting the current directories and settings.
    pub fn config(&self) -> AppConfig {
        let mut config = self.config.clone();
        config.preferences.brush_radius = self.session.brush_radius();
        config.preferences.mask_opacity = self.session.opacity();
        config.preferences.refine_iterations = self.session.refine_iterations();
        config
    }

    /// Mask path of the current image for the active category.
    pub fn current_label_path(&self) -> Option<PathBuf> {
        let project = self.project.as_ref()?;
        project.label_path(project.current_index, self.categories.current())
    }

    // ========================================================================
    // Unsaved changes
    // ========================================================================

    /// Apply the unsaved-changes policy. Returns whether to proceed.
    fn resolve_unsaved(&mut self, choice: Option<UnsavedChoice>) -> Result<bool> {
        if !self.session.is_dirty() {
            return Ok(true);
        }
        match choice {
            None => Err(SegmenterError::UnsavedChanges),
            Some(UnsavedChoice::Save) => {
                self.save_mask()?;
                Ok(true)
            }
            Some(UnsavedChoice::Discard) => {
                log::info!("Discarding unsaved changes");
                Ok(true)
            }
            Some(UnsavedChoice::Cancel) => Ok(false),
        }
    }

    /// Write the current mask to its label file and clear the dirty flag.
    pub fn save_mask(&mut self) -> Result<()> {
        let mask = self.session.mask().ok_or(SegmenterError::NoImageLoaded)?;
        let path = self
            .current_label_path()
            .ok_or(SegmenterError::NoImageDirectory)?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        save_mask_png(mask, &path)?;
        self.session.mark_saved();
        Ok(())
    }

    /// Check whether the application may quit.
    pub fn request_exit(&mut self, choice: Option<UnsavedChoice>) -> Result<bool> {
        let proceed = self.resolve_unsaved(choice)?;
        if proceed {
            self.session.cancel_refine();
            log::info!("Exit confirmed");
        }
        Ok(proceed)
    }

    // ========================================================================
    // Directories
    // ========================================================================

    /// Scan `dir` for images and show the first one.
    ///
    /// The label directory defaults to the image directory unless one was
    /// chosen before.
    pub fn open_image_dir(
        &mut self,
        dir: &Path,
        choice: Option<UnsavedChoice>,
    ) -> Result<NavigationOutcome> {
        if !self.resolve_unsaved(choice)? {
            return Ok(NavigationOutcome::Cancelled);
        }

        let mut project = ProjectState::from_folder(dir.to_path_buf())?;
        let label_dir = self
            .project
            .as_ref()
            .and_then(|p| p.label_dir().map(Path::to_path_buf))
            .or_else(|| self.config.preferences.last_label_dir.clone());
        if let Some(label_dir) = label_dir {
            project.set_label_dir(label_dir);
        }
        // Nothing is committed until the first image has decoded
        let first_image = match project.images.first() {
            Some(path) => Some(load_image(path)?),
            None => None,
        };
        ensure_dir(&project.category_dir(self.categories.current()))?;

        log::info!("📁 Opened image directory {:?} ({} images)", dir, project.len());
        self.config.preferences.last_image_dir = Some(dir.to_path_buf());
        self.project = Some(project);

        let Some(image) = first_image else {
            self.session.clear_image();
            return Ok(NavigationOutcome::Unchanged);
        };
        self.session.set_image(image)?;
        self.load_current_mask()?;
        Ok(NavigationOutcome::Loaded(0))
    }

    /// Use `dir` as the label directory and reload the current mask from it.
    pub fn set_label_dir(
        &mut self,
        dir: &Path,
        choice: Option<UnsavedChoice>,
    ) -> Result<NavigationOutcome> {
        if !self.resolve_unsaved(choice)? {
            return Ok(NavigationOutcome::Cancelled);
        }
        ensure_dir(&dir.join(self.categories.current().folder_name()))?;
        self.config.preferences.last_label_dir = Some(dir.to_path_buf());
        log::info!("📁 Label directory {:?}", dir);

        let Some(project) = self.project.as_mut() else {
            return Ok(NavigationOutcome::Unchanged);
        };
        project.set_label_dir(dir.to_path_buf());
        if project.is_empty() {
            return Ok(NavigationOutcome::Unchanged);
        }
        let index = project.current_index;
        self.load_current_mask()?;
        Ok(NavigationOutcome::Loaded(index))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Show the image at `index`.
    pub fn goto_image(
        &mut self,
        index: usize,
        choice: Option<UnsavedChoice>,
    ) -> Result<NavigationOutcome> {
        let project = self.project.as_ref().ok_or(SegmenterError::NoImageDirectory)?;
        if index >= project.len() {
            return Err(SegmenterError::ImageIndexOutOfRange {
                index,
                count: project.len(),
            });
        }
        if !self.resolve_unsaved(choice)? {
            return Ok(NavigationOutcome::Cancelled);
        }
        self.load_image_at(index)?;
        Ok(NavigationOutcome::Loaded(index))
    }

    /// Show the next image. Does not wrap.
    pub fn next_image(&mut self, choice: Option<UnsavedChoice>) -> Result<NavigationOutcome> {
        let project = self.project.as_ref().ok_or(SegmenterError::NoImageDirectory)?;
        match project.next_index() {
            Some(index) => self.goto_image(index, choice),
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    /// Show the previous image. Does not wrap.
    pub fn previous_image(&mut self, choice: Option<UnsavedChoice>) -> Result<NavigationOutcome> {
        let project = self.project.as_ref().ok_or(SegmenterError::NoImageDirectory)?;
        match project.previous_index() {
            Some(index) => self.goto_image(index, choice),
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    /// Show the next image without a mask for the active category.
    pub fn next_unlabeled(&mut self, choice: Option<UnsavedChoice>) -> Result<NavigationOutcome> {
        self.skip_to(false, choice)
    }

    /// Show the next image with a mask for the active category.
    pub fn next_labeled(&mut self, choice: Option<UnsavedChoice>) -> Result<NavigationOutcome> {
        self.skip_to(true, choice)
    }

    fn skip_to(&mut self, labeled: bool, choice: Option<UnsavedChoice>) -> Result<NavigationOutcome> {
        let project = self.project.as_ref().ok_or(SegmenterError::NoImageDirectory)?;
        let category = self.categories.current();
        match project.find_after_current(category, labeled) {
            Some(index) => self.goto_image(index, choice),
            None => Err(SegmenterError::NoMatchingImage {
                wanted: if labeled { "labeled" } else { "unlabeled" },
                category: category.name.clone(),
            }),
        }
    }

    /// Switch the active category and show its mask for the current image.
    ///
    /// On `Cancel`, or on a missing decision, the previous category stays
    /// selected and the mask is untouched. `Save` writes the mask to the
    /// previous category's file.
    pub fn change_category(
        &mut self,
        name: &str,
        choice: Option<UnsavedChoice>,
    ) -> Result<NavigationOutcome> {
        if !self.categories.categories().iter().any(|c| c.name == name) {
            return Err(SegmenterError::UnknownCategory(name.to_string()));
        }
        if self.categories.current().name == name {
            return Ok(NavigationOutcome::Unchanged);
        }
        // Resolved against the outgoing category, so Save writes its file
        if !self.resolve_unsaved(choice)? {
            self.categories.select(name)?;
            self.categories.revert();
            log::info!("Category change cancelled, keeping {}", self.categories.current().name);
            return Ok(NavigationOutcome::Cancelled);
        }

        self.categories.select(name)?;
        if let Some(project) = self.project.as_ref() {
            if let Err(e) = ensure_dir(&project.category_dir(self.categories.current())) {
                self.categories.revert();
                return Err(e);
            }
        }
        log::info!("🏷️ Category changed to {}", self.categories.current().name);

        if self.session.has_image() {
            self.load_current_mask()?;
        }
        Ok(NavigationOutcome::CategoryChanged)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    fn load_image_at(&mut self, index: usize) -> Result<()> {
        let project = self.project.as_mut().ok_or(SegmenterError::NoImageDirectory)?;
        let path = project
            .images
            .get(index)
            .cloned()
            .ok_or(SegmenterError::ImageIndexOutOfRange {
                index,
                count: project.len(),
            })?;
        let image = load_image(&path)?;
        project.current_index = index;
        self.session.set_image(image)?;
        self.load_current_mask()
    }

    /// Load the active category's mask for the current image, or a blank one.
    fn load_current_mask(&mut self) -> Result<()> {
        self.session.cancel_refine();
        let Some(image) = self.session.image() else {
            return Ok(());
        };
        let (width, height) = image.dimensions();
        let Some(path) = self.current_label_path() else {
            return self.session.discard_mask();
        };
        if !path.is_file() {
            return self.session.discard_mask();
        }
        match load_mask_png(&path, width, height) {
            Ok(mask) => self.session.load_mask(mask),
            Err(e) => {
                log::warn!("Ignoring unreadable mask {:?}: {}", path, e);
                self.session.discard_mask()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::save_mask_png;
    use crate::mask::{Channel, RasterMask};
    use crate::paint::ImagePoint;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn image_dir(names: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (i, name) in names.iter().enumerate() {
            RgbImage::from_pixel(6, 4, Rgb([i as u8 * 40, 80, 120]))
                .save_with_format(dir.path().join(name), image::ImageFormat::Png)
                .unwrap();
        }
        dir
    }

    fn workspace(dir: &TempDir) -> Workspace {
        let mut workspace = Workspace::new(AppConfig::default(), 60.0, 40.0);
        workspace.open_image_dir(dir.path(), None).unwrap();
        workspace
    }

    fn paint(workspace: &mut Workspace) {
        let session = workspace.session_mut();
        session.begin_stroke(ImagePoint::new(1.5, 1.5)).unwrap();
        session.end_stroke();
    }

    #[test]
    fn test_open_creates_category_folder_and_loads_first() {
        let dir = image_dir(&["b.png", "a.png"]);
        let workspace = workspace(&dir);

        assert!(dir.path().join("Foot").is_dir());
        let project = workspace.project().unwrap();
        assert_eq!(project.current_index, 0);
        assert_eq!(project.current_name(), "a");
        assert_eq!(workspace.session().mask().unwrap().dimensions(), (6, 4));
    }

    #[test]
    fn test_open_undecodable_dir_changes_nothing() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        paint(&mut workspace);
        let painted = workspace.session().mask().unwrap().clone();

        // PNG magic bytes followed by junk: listed, but fails to decode
        let broken = tempfile::tempdir().unwrap();
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"garbage");
        std::fs::write(broken.path().join("z.png"), &bytes).unwrap();

        let result = workspace.open_image_dir(broken.path(), Some(UnsavedChoice::Discard));
        assert!(matches!(result, Err(SegmenterError::Format(_))));

        assert_eq!(workspace.project().unwrap().image_dir, dir.path());
        assert_eq!(workspace.session().mask().unwrap(), &painted);
        assert!(workspace.session().is_dirty());
        assert!(!broken.path().join("Foot").exists());
        assert_eq!(
            workspace.config().preferences.last_image_dir.as_deref(),
            Some(dir.path())
        );

        // A later save still targets the original image
        workspace.save_mask().unwrap();
        assert!(dir.path().join("Foot").join("a_label.png").is_file());
        assert!(!broken.path().join("Foot").exists());
    }

    #[test]
    fn test_dirty_navigation_needs_decision() {
        let dir = image_dir(&["a.png", "b.png"]);
        let mut workspace = workspace(&dir);
        paint(&mut workspace);

        assert!(matches!(
            workspace.next_image(None),
            Err(SegmenterError::UnsavedChanges)
        ));
        assert_eq!(workspace.project().unwrap().current_index, 0);

        assert_eq!(
            workspace.next_image(Some(UnsavedChoice::Cancel)).unwrap(),
            NavigationOutcome::Cancelled
        );
        assert!(workspace.session().is_dirty());

        assert_eq!(
            workspace.next_image(Some(UnsavedChoice::Discard)).unwrap(),
            NavigationOutcome::Loaded(1)
        );
        assert!(!dir.path().join("Foot").join("a_label.png").exists());
        assert!(!workspace.session().can_undo());
    }

    #[test]
    fn test_save_then_reload() {
        let dir = image_dir(&["a.png", "b.png"]);
        let mut workspace = workspace(&dir);
        paint(&mut workspace);
        let painted = workspace.session().mask().unwrap().clone();

        workspace.next_image(Some(UnsavedChoice::Save)).unwrap();
        assert!(dir.path().join("Foot").join("a_label.png").is_file());

        workspace.previous_image(None).unwrap();
        assert_eq!(workspace.session().mask().unwrap(), &painted);
        assert!(!workspace.session().is_dirty());
    }

    #[test]
    fn test_cancel_category_switch_keeps_previous() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        paint(&mut workspace);
        let painted = workspace.session().mask().unwrap().clone();

        let outcome = workspace
            .change_category("Inner Wound", Some(UnsavedChoice::Cancel))
            .unwrap();
        assert_eq!(outcome, NavigationOutcome::Cancelled);
        assert_eq!(workspace.current_category().name, "Foot");
        assert_eq!(workspace.session().mask().unwrap(), &painted);
        assert!(workspace.session().is_dirty());
        assert!(!dir.path().join("Foot").join("a_label.png").exists());
        assert!(!dir.path().join("Inner_Wound").exists());
    }

    #[test]
    fn test_category_switch_saves_to_previous_category() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        paint(&mut workspace);

        let outcome = workspace
            .change_category("Inner Wound", Some(UnsavedChoice::Save))
            .unwrap();
        assert_eq!(outcome, NavigationOutcome::CategoryChanged);
        assert!(dir.path().join("Foot").join("a_label.png").is_file());
        assert!(dir.path().join("Inner_Wound").is_dir());
        assert!(workspace.session().mask().unwrap().is_blank());
        assert!(!workspace.session().can_undo());
    }

    #[test]
    fn test_category_folder_blocked_by_file() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        std::fs::write(dir.path().join("Outer_Wound"), b"x").unwrap();

        let err = workspace.change_category("Outer Wound", None).unwrap_err();
        assert!(matches!(err, SegmenterError::DirectoryCreationConflict { .. }));
        assert_eq!(workspace.current_category().name, "Foot");
    }

    #[test]
    fn test_skip_to_labeled_and_unlabeled() {
        let dir = image_dir(&["a.png", "b.png", "c.png", "d.png"]);
        let foot = dir.path().join("Foot");
        std::fs::create_dir_all(&foot).unwrap();
        let mut mask = RasterMask::new(6, 4).unwrap();
        mask.set_pixel(0, 0, Channel::Background.pixel_value());
        save_mask_png(&mask, &foot.join("c_label.png")).unwrap();
        save_mask_png(&mask, &foot.join("b_label.png")).unwrap();

        let mut workspace = workspace(&dir);
        assert_eq!(workspace.next_labeled(None).unwrap(), NavigationOutcome::Loaded(1));
        assert_eq!(workspace.session().mask().unwrap(), &mask);
        assert_eq!(workspace.next_unlabeled(None).unwrap(), NavigationOutcome::Loaded(3));
        assert!(matches!(
            workspace.next_labeled(None),
            Err(SegmenterError::NoMatchingImage { wanted: "labeled", .. })
        ));
    }

    #[test]
    fn test_separate_label_dir() {
        let dir = image_dir(&["a.png"]);
        let labels = tempfile::tempdir().unwrap();
        let mut workspace = workspace(&dir);

        workspace.set_label_dir(labels.path(), None).unwrap();
        paint(&mut workspace);
        workspace.save_mask().unwrap();

        assert!(labels.path().join("Foot").join("a_label.png").is_file());
        assert!(!workspace.session().is_dirty());
        assert_eq!(
            workspace.config().preferences.last_label_dir.as_deref(),
            Some(labels.path())
        );
    }

    #[test]
    fn test_goto_out_of_range() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        assert!(matches!(
            workspace.goto_image(5, None),
            Err(SegmenterError::ImageIndexOutOfRange { index: 5, count: 1 })
        ));
        assert_eq!(workspace.next_image(None).unwrap(), NavigationOutcome::Unchanged);
    }

    #[test]
    fn test_request_exit() {
        let dir = image_dir(&["a.png"]);
        let mut workspace = workspace(&dir);
        assert!(workspace.request_exit(None).unwrap());

        paint(&mut workspace);
        assert!(matches!(
            workspace.request_exit(None),
            Err(SegmenterError::UnsavedChanges)
        ));
        assert!(!workspace.request_exit(Some(UnsavedChoice::Cancel)).unwrap());
        assert!(workspace.request_exit(Some(UnsavedChoice::Save)).unwrap());
        assert!(dir.path().join("Foot").join("a_label.png").is_file());
    }

    #[test]
    fn test_navigation_without_directory() {
        let mut workspace = Workspace::new(AppConfig::default(), 10.0, 10.0);
        assert!(matches!(
            workspace.next_image(None),
            Err(SegmenterError::NoImageDirectory)
        ));
    }
}
