//! Editing session: the single owner and writer of the current mask.
//!
//! Every mask mutation goes through [`EditorSession`], which snapshots the
//! history before edits, tracks the unsaved-changes flag and locks editing
//! while a background refinement is running.

use std::sync::Arc;

use image::{RgbImage, RgbaImage};

use crate::constants::DEFAULT_MASK_OPACITY;
use crate::error::{Result, SegmenterError};
use crate::mask::{ColorMap, RasterMask};
use crate::paint::{ImagePoint, PaintEngine, PaintMode};
use crate::segmentation::{CancelToken, RefineOutcome, RefineWorker, SegmentationRefiner};
use crate::undo::HistoryStack;
use crate::viewport::ViewportController;

/// A refinement dispatched to the worker and not yet installed.
#[derive(Debug)]
struct PendingRefine {
    id: u64,
    cancel: CancelToken,
}

/// Image, mask and editing state of the open image.
pub struct EditorSession {
    image: Option<Arc<RgbImage>>,
    mask: Option<RasterMask>,
    history: HistoryStack,
    painter: PaintEngine,
    viewport: ViewportController,
    refiner: SegmentationRefiner,
    worker: Option<RefineWorker>,
    pending: Option<PendingRefine>,
    dirty: bool,
    colors: ColorMap,
    opacity: f32,
}

impl EditorSession {
    /// Create an empty session for a view of the given size.
    pub fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            image: None,
            mask: None,
            history: HistoryStack::new(),
            painter: PaintEngine::new(),
            viewport: ViewportController::new(view_width, view_height),
            refiner: SegmentationRefiner::new(),
            worker: None,
            pending: None,
            dirty: false,
            colors: ColorMap::default(),
            opacity: DEFAULT_MASK_OPACITY,
        }
    }

    // ========================================================================
    // Image and mask
    // ========================================================================

    /// Show a new image with a blank mask.
    ///
    /// Any running refinement is cancelled, history is cleared and the view
    /// is refitted.
    pub fn set_image(&mut self, image: RgbImage) -> Result<()> {
        let (width, height) = image.dimensions();
        let mask = RasterMask::new(width, height)?;

        self.cancel_refine();
        self.painter.end_stroke();
        self.image = Some(Arc::new(image));
        self.mask = Some(mask);
        self.history.clear_history();
        self.viewport.set_image_size(width, height);
        self.dirty = false;
        log::info!("🖼️ Session image set ({}x{})", width, height);
        Ok(())
    }

    /// Close the image.
    pub fn clear_image(&mut self) {
        self.cancel_refine();
        self.painter.end_stroke();
        self.image = None;
        self.mask = None;
        self.history.clear_history();
        self.viewport.clear_image();
        self.dirty = false;
    }

    /// Replace the mask with one loaded from storage. Clears history and the
    /// unsaved-changes flag.
    pub fn load_mask(&mut self, mask: RasterMask) -> Result<()> {
        self.ensure_unlocked()?;
        let image = self.image.as_ref().ok_or(SegmenterError::NoImageLoaded)?;
        if mask.dimensions() != image.dimensions() {
            return Err(SegmenterError::SizeMismatch {
                image_width: image.width(),
                image_height: image.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }
        self.painter.end_stroke();
        self.mask = Some(mask);
        self.history.clear_history();
        self.dirty = false;
        Ok(())
    }

    /// Replace the mask with a blank one and forget its history.
    /// Used when switching to a category that has no mask yet.
    pub fn discard_mask(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        let image = self.image.as_ref().ok_or(SegmenterError::NoImageLoaded)?;
        self.painter.end_stroke();
        self.mask = Some(RasterMask::new(image.width(), image.height())?);
        self.history.clear_history();
        self.dirty = false;
        Ok(())
    }

    /// Clear every painted pixel. Undoable.
    pub fn reset_mask(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        let mask = self.mask.as_mut().ok_or(SegmenterError::NoImageLoaded)?;
        self.painter.end_stroke();
        self.history.save_state(mask);
        *mask = RasterMask::new(mask.width(), mask.height())?;
        self.dirty = true;
        log::debug!("🗑️ Mask cleared");
        Ok(())
    }

    /// The open image.
    pub fn image(&self) -> Option<&Arc<RgbImage>> {
        self.image.as_ref()
    }

    /// The current mask.
    pub fn mask(&self) -> Option<&RasterMask> {
        self.mask.as_ref()
    }

    /// Check if an image is open.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Check if the mask has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the mask as saved.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Check if editing is locked by a running refinement.
    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            Err(SegmenterError::EditingLocked)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Undo the last edit. Returns whether anything changed.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_unlocked()?;
        let Some(mask) = self.mask.as_mut() else {
            return Ok(false);
        };
        self.painter.end_stroke();
        let changed = self.history.undo(mask);
        self.dirty |= changed;
        Ok(changed)
    }

    /// Redo the last undone edit. Returns whether anything changed.
    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_unlocked()?;
        let Some(mask) = self.mask.as_mut() else {
            return Ok(false);
        };
        self.painter.end_stroke();
        let changed = self.history.redo(mask);
        self.dirty |= changed;
        Ok(changed)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.is_locked() && self.history.can_undo()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.is_locked() && self.history.can_redo()
    }

    /// The history stack.
    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Drop all undo/redo states.
    pub fn clear_history(&mut self) {
        self.history.clear_history();
    }

    // ========================================================================
    // Painting
    // ========================================================================

    /// Mode used for the next stroke.
    pub fn paint_mode(&self) -> PaintMode {
        self.painter.mode()
    }

    /// Select the mode for subsequent strokes.
    pub fn set_paint_mode(&mut self, mode: PaintMode) {
        self.painter.set_mode(mode);
    }

    /// Brush radius in image pixels.
    pub fn brush_radius(&self) -> f32 {
        self.painter.brush_radius()
    }

    /// Set the brush radius for subsequent strokes.
    pub fn set_brush_radius(&mut self, radius: f32) {
        self.painter.set_brush_radius(radius);
    }

    /// Check if a stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        self.painter.is_stroking()
    }

    /// Start a stroke at `point` with the current paint mode.
    ///
    /// Returns `Ok(false)` without painting when no image is open or the
    /// point lies outside the image.
    pub fn begin_stroke(&mut self, point: ImagePoint) -> Result<bool> {
        self.ensure_unlocked()?;
        let Some(mask) = self.mask.as_mut() else {
            return Ok(false);
        };
        let (x, y) = point.pixel();
        if !mask.contains(x, y) {
            return Ok(false);
        }

        self.history.save_state(mask);
        let mode = self.painter.mode();
        let written = self.painter.begin_stroke(mask, point, mode);
        self.dirty = true;
        log::debug!("🖌️ Stroke started ({}, {} px)", mode.name(), written);
        Ok(true)
    }

    /// Continue the active stroke. Returns the number of pixels written.
    pub fn extend_stroke(&mut self, point: ImagePoint) -> Result<usize> {
        self.ensure_unlocked()?;
        let Some(mask) = self.mask.as_mut() else {
            return Ok(0);
        };
        if !self.painter.is_stroking() {
            return Ok(0);
        }
        let written = self.painter.extend_stroke(mask, point);
        self.dirty = true;
        Ok(written)
    }

    /// Finish the active stroke. Returns whether one was active.
    pub fn end_stroke(&mut self) -> bool {
        self.painter.end_stroke()
    }

    // ========================================================================
    // Refinement
    // ========================================================================

    /// Number of GrabCut rounds per refinement.
    pub fn refine_iterations(&self) -> usize {
        self.refiner.iterations()
    }

    /// Set the number of GrabCut rounds per refinement.
    pub fn set_refine_iterations(&mut self, iterations: usize) {
        self.refiner = SegmentationRefiner::with_iterations(iterations);
    }

    /// Refine the mask on this thread. On failure the mask is unchanged.
    pub fn refine_now(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        let (Some(image), Some(mask)) = (self.image.as_ref(), self.mask.as_mut()) else {
            return Err(SegmenterError::NoImageLoaded);
        };
        self.painter.end_stroke();

        let refined = self.refiner.refine(image, mask)?;
        self.history.save_state(mask);
        *mask = refined;
        self.dirty = true;
        Ok(())
    }

    /// Dispatch a refinement to the background worker and lock editing.
    /// Returns the job ID.
    pub fn start_refine(&mut self) -> Result<u64> {
        self.ensure_unlocked()?;
        let (Some(image), Some(mask)) = (self.image.as_ref(), self.mask.as_ref()) else {
            return Err(SegmenterError::NoImageLoaded);
        };
        SegmentationRefiner::validate_seed(mask)?;
        let labels = SegmentationRefiner::encode(mask);
        let image = Arc::clone(image);

        self.painter.end_stroke();
        if self.worker.is_none() {
            self.worker = Some(RefineWorker::spawn()?);
        }
        let Some(worker) = self.worker.as_mut() else {
            return Err(SegmenterError::WorkerUnavailable("no worker".to_string()));
        };
        let cancel = CancelToken::new();
        let id = worker.submit(image, labels, self.refiner.iterations(), cancel.clone())?;
        self.pending = Some(PendingRefine { id, cancel });
        log::info!("✂️ Refinement {} dispatched, editing locked", id);
        Ok(id)
    }

    /// Install a finished background refinement, if any.
    ///
    /// Returns `Ok(true)` when a refined mask was installed, `Ok(false)` while
    /// nothing is pending or the job is still running. A failed job unlocks
    /// editing and returns its error.
    pub fn poll_refine(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            return Ok(false);
        }
        loop {
            let received = match self.worker.as_ref() {
                Some(worker) => worker.try_recv(),
                None => Err(SegmenterError::WorkerUnavailable("no worker".to_string())),
            };
            let outcome = match received {
                Ok(Some(outcome)) => outcome,
                Ok(None) => return Ok(false),
                Err(e) => {
                    self.pending = None;
                    return Err(e);
                }
            };
            if let Some(applied) = self.apply_outcome(outcome)? {
                return Ok(applied);
            }
        }
    }

    /// Block until the pending refinement finishes, then install it.
    /// Returns `Ok(false)` if nothing was pending.
    pub fn wait_refine(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            return Ok(false);
        }
        loop {
            let outcome = match self.worker.as_ref().map(RefineWorker::wait) {
                Some(Ok(outcome)) => outcome,
                Some(Err(e)) => {
                    self.pending = None;
                    return Err(e);
                }
                None => {
                    self.pending = None;
                    return Err(SegmenterError::WorkerUnavailable("no worker".to_string()));
                }
            };
            if let Some(applied) = self.apply_outcome(outcome)? {
                return Ok(applied);
            }
        }
    }

    /// Handle one worker outcome. `None` means it belonged to an abandoned job.
    fn apply_outcome(&mut self, outcome: RefineOutcome) -> Result<Option<bool>> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };
        if outcome.id != pending.id {
            log::debug!("Discarding stale refinement {}", outcome.id);
            return Ok(None);
        }
        self.pending = None;

        let labels = outcome.result?;
        let Some(mask) = self.mask.as_mut() else {
            return Err(SegmenterError::NoImageLoaded);
        };
        self.history.save_state(mask);
        *mask = SegmentationRefiner::decode(&labels);
        self.dirty = true;
        log::info!("✂️ Refinement {} installed, editing unlocked", outcome.id);
        Ok(Some(true))
    }

    /// Abandon the running refinement and unlock editing. Returns whether one
    /// was running.
    pub fn cancel_refine(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        pending.cancel.cancel();
        log::info!("🛑 Refinement {} cancelled", pending.id);
        true
    }

    // ========================================================================
    // View
    // ========================================================================

    /// The viewport controller.
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Mutable access to the viewport controller.
    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    /// Overlay opacity (0.0 - 1.0).
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the overlay opacity, clamped to 0.0 - 1.0.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Overlay colours.
    pub fn color_map(&self) -> &ColorMap {
        &self.colors
    }

    /// Replace the overlay colours.
    pub fn set_color_map(&mut self, colors: ColorMap) {
        self.colors = colors;
    }

    /// RGBA overlay of the current mask.
    pub fn overlay(&self) -> Option<RgbaImage> {
        self.mask
            .as_ref()
            .map(|mask| mask.composite_for_display(&self.colors, self.opacity))
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        // Stop the worker between iterations instead of joining a full job
        self.cancel_refine();
    }
}
