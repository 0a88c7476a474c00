//! GrabCut refinement of hand-painted masks.
//!
//! The refiner turns a [`RasterMask`] into a [`LabelMap`], runs a bounded
//! number of GrabCut iterations against the image and turns the refined
//! labels back into a mask. It holds no state between calls.

mod gmm;
mod grabcut;
mod graph;
mod label;
mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbImage;
use web_time::Instant;

use crate::constants::DEFAULT_REFINE_ITERATIONS;
use crate::error::{MissingClass, Result, SegmenterError};
use crate::mask::{Channel, RasterMask};

pub use label::{LabelMap, SegLabel};
pub use worker::{RefineOutcome, RefineWorker};

/// Shared flag asking a running refinement to stop.
///
/// Checked between iterations; an iteration in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Stateless GrabCut refiner.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationRefiner {
    iterations: usize,
}

impl Default for SegmentationRefiner {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationRefiner {
    /// Refiner running the default number of iterations.
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_REFINE_ITERATIONS)
    }

    /// Refiner running `iterations` rounds (at least one).
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Number of GrabCut rounds per refinement.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Check that the mask seeds both classes.
    ///
    /// Background is checked first. A pixel seeds background when its
    /// background plane is set or its coverage is below full, so a blank mask
    /// is missing foreground. A colourless pixel with full coverage seeds
    /// neither class.
    pub fn validate_seed(mask: &RasterMask) -> Result<()> {
        let coverage = mask.channel(Channel::PossibleBackground);
        let has_background = mask.has_coverage(Channel::Background)
            || coverage.iter().any(|&v| v < u8::MAX);
        if !has_background {
            return Err(SegmenterError::InsufficientSeed(MissingClass::Background));
        }
        let has_foreground = mask.has_coverage(Channel::Foreground)
            || mask.has_coverage(Channel::PossibleForeground);
        if !has_foreground {
            return Err(SegmenterError::InsufficientSeed(MissingClass::Foreground));
        }
        Ok(())
    }

    /// Mask to labels: foreground > background > possible foreground > unpainted.
    pub fn encode(mask: &RasterMask) -> LabelMap {
        label::encode(mask)
    }

    /// Labels to mask.
    pub fn decode(labels: &LabelMap) -> RasterMask {
        label::decode(labels)
    }

    /// Refine a mask, returning the new mask. The input is not modified.
    pub fn refine(&self, image: &RgbImage, mask: &RasterMask) -> Result<RasterMask> {
        self.refine_with_cancel(image, mask, &CancelToken::new())
    }

    /// [`refine`](Self::refine) with a cancellation token.
    pub fn refine_with_cancel(
        &self,
        image: &RgbImage,
        mask: &RasterMask,
        cancel: &CancelToken,
    ) -> Result<RasterMask> {
        Self::validate_seed(mask)?;
        let labels = self.refine_labels(image, Self::encode(mask), cancel)?;
        Ok(Self::decode(&labels))
    }

    /// Run GrabCut on an already-encoded label map.
    pub fn refine_labels(
        &self,
        image: &RgbImage,
        mut labels: LabelMap,
        cancel: &CancelToken,
    ) -> Result<LabelMap> {
        let start = Instant::now();
        grabcut::grabcut(image, &mut labels, self.iterations, cancel)?;
        log::info!(
            "✂️ Refined {}x{} mask in {:?} ({} iterations)",
            labels.width(),
            labels.height(),
            start.elapsed(),
            self.iterations
        );
        Ok(labels)
    }
}
