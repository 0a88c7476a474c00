//! Brush painting into a [`RasterMask`].
//!
//! A stroke is rasterized incrementally: the first point stamps a round disc,
//! every following point draws a round-capped segment from the previous one.
//! Pixels are covered when their centre lies within the brush radius.
//! Everything outside the mask is clipped.

use crate::constants::{DEFAULT_BRUSH_RADIUS, MAX_BRUSH_RADIUS, MIN_BRUSH_RADIUS};
use crate::mask::{CHANNEL_COUNT, Channel, RasterMask};

/// A point in image space (pixel units, origin at the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    /// Create a new image-space point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel containing this point.
    pub fn pixel(&self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

/// What a brush stroke writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintMode {
    #[default]
    Foreground,
    PossibleForeground,
    Background,
    /// Clears painted pixels back to transparent (possible background)
    Erase,
}

impl PaintMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            PaintMode::Foreground => "Foreground",
            PaintMode::PossibleForeground => "Possible Foreground",
            PaintMode::Background => "Background",
            PaintMode::Erase => "Erase",
        }
    }

    /// Get all paint modes in toolbar order.
    pub fn all() -> &'static [PaintMode] {
        &[
            PaintMode::Foreground,
            PaintMode::PossibleForeground,
            PaintMode::Background,
            PaintMode::Erase,
        ]
    }

    /// Channel whose pixel value this mode writes.
    pub fn target(self) -> Channel {
        match self {
            PaintMode::Foreground => Channel::Foreground,
            PaintMode::PossibleForeground => Channel::PossibleForeground,
            PaintMode::Background => Channel::Background,
            PaintMode::Erase => Channel::PossibleBackground,
        }
    }
}

/// State of the stroke currently being drawn.
#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    mode: PaintMode,
    last: Option<ImagePoint>,
}

/// Stateful stroke renderer.
#[derive(Debug, Clone)]
pub struct PaintEngine {
    mode: PaintMode,
    brush_radius: f32,
    stroke: Option<ActiveStroke>,
}

impl Default for PaintEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintEngine {
    /// Create an engine painting foreground with the default brush.
    pub fn new() -> Self {
        Self {
            mode: PaintMode::default(),
            brush_radius: DEFAULT_BRUSH_RADIUS,
            stroke: None,
        }
    }

    /// Mode used for the next stroke.
    pub fn mode(&self) -> PaintMode {
        self.mode
    }

    /// Select the mode for subsequent strokes. An active stroke keeps its mode.
    pub fn set_mode(&mut self, mode: PaintMode) {
        log::debug!("🖌️ Paint mode: {}", mode.name());
        self.mode = mode;
    }

    /// Current brush radius in image pixels.
    pub fn brush_radius(&self) -> f32 {
        self.brush_radius
    }

    /// Set the brush radius, clamped to the supported range.
    pub fn set_brush_radius(&mut self, radius: f32) {
        self.brush_radius = radius.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS);
    }

    /// Check if a stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Start a stroke and stamp its first point.
    ///
    /// The caller snapshots history before this call. Returns the number of
    /// pixels written.
    pub fn begin_stroke(&mut self, mask: &mut RasterMask, point: ImagePoint, mode: PaintMode) -> usize {
        self.stroke = Some(ActiveStroke { mode, last: None });
        self.extend_stroke(mask, point)
    }

    /// Continue the active stroke to `point`.
    ///
    /// Without a previous point a single disc is stamped. Returns the number of
    /// pixels written, 0 when no stroke is active.
    pub fn extend_stroke(&mut self, mask: &mut RasterMask, point: ImagePoint) -> usize {
        let radius = self.brush_radius;
        let Some(stroke) = self.stroke.as_mut() else {
            return 0;
        };

        let value = stroke.mode.target().pixel_value();
        let written = match stroke.last {
            Some(prev) => paint_segment(mask, prev, point, radius, value),
            None => paint_disc(mask, point, radius, value),
        };
        stroke.last = Some(point);
        written
    }

    /// Finish the active stroke. Returns whether one was active.
    pub fn end_stroke(&mut self) -> bool {
        self.stroke.take().is_some()
    }
}

/// Stamp a filled disc centred at `center`. Returns the number of pixels written.
pub fn paint_disc(
    mask: &mut RasterMask,
    center: ImagePoint,
    radius: f32,
    value: [u8; CHANNEL_COUNT],
) -> usize {
    paint_segment(mask, center, center, radius, value)
}

/// Draw a round-capped segment from `a` to `b`. Returns the number of pixels written.
///
/// The pixels containing either endpoint are always covered so a tiny brush
/// still leaves a mark.
pub fn paint_segment(
    mask: &mut RasterMask,
    a: ImagePoint,
    b: ImagePoint,
    radius: f32,
    value: [u8; CHANNEL_COUNT],
) -> usize {
    let width = i64::from(mask.width());
    let height = i64::from(mask.height());

    let min_x = ((a.x.min(b.x) - radius).floor() as i64).max(0);
    let max_x = ((a.x.max(b.x) + radius).ceil() as i64).min(width - 1);
    let min_y = ((a.y.min(b.y) - radius).floor() as i64).max(0);
    let max_y = ((a.y.max(b.y) + radius).ceil() as i64).min(height - 1);
    if min_x > max_x || min_y > max_y {
        return 0;
    }

    let radius_sq = radius * radius;
    let endpoints = [a.pixel(), b.pixel()];
    let mut written = 0;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = ImagePoint::new(x as f32 + 0.5, y as f32 + 0.5);
            if distance_sq_to_segment(center, a, b) <= radius_sq || endpoints.contains(&(x, y)) {
                mask.set_pixel(x as u32, y as u32, value);
                written += 1;
            }
        }
    }
    written
}

/// Squared distance from `p` to the segment `a`-`b`.
fn distance_sq_to_segment(p: ImagePoint, a: ImagePoint, b: ImagePoint) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.x + t * dx - p.x;
    let cy = a.y + t * dy - p.y;
    cx * cx + cy * cy
}
