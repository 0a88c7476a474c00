//! Symbolic GrabCut labels and their mapping to and from mask planes.
//!
//! Encoding (mask → labels) takes each pixel's dominant channel, see
//! [`Channel::dominant`]:
//!
//! | dominant channel     | label                |
//! |----------------------|----------------------|
//! | foreground           | `Foreground`         |
//! | background           | `Background`         |
//! | possible foreground  | `ProbableForeground` |
//! | none (unpainted)     | `ProbableBackground` |
//!
//! Decoding (labels → mask) writes the channel's pixel value, so the inverted
//! possible-background plane ends up 255 everywhere except at
//! `ProbableBackground` pixels, which become fully transparent.

use ndarray::Array3;

use crate::error::{Result, SegmenterError};
use crate::mask::{CHANNEL_COUNT, Channel, RasterMask};

/// Per-pixel GrabCut label. Discriminants follow the classical numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SegLabel {
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl SegLabel {
    /// Label for a mask channel.
    pub fn from_channel(channel: Channel) -> Self {
        match channel {
            Channel::Foreground => SegLabel::Foreground,
            Channel::Background => SegLabel::Background,
            Channel::PossibleForeground => SegLabel::ProbableForeground,
            Channel::PossibleBackground => SegLabel::ProbableBackground,
        }
    }

    /// Mask channel for this label.
    pub fn channel(self) -> Channel {
        match self {
            SegLabel::Foreground => Channel::Foreground,
            SegLabel::Background => Channel::Background,
            SegLabel::ProbableForeground => Channel::PossibleForeground,
            SegLabel::ProbableBackground => Channel::PossibleBackground,
        }
    }

    /// Whether the label belongs to the foreground class.
    pub fn is_foreground(self) -> bool {
        matches!(self, SegLabel::Foreground | SegLabel::ProbableForeground)
    }

    /// Whether the label is a hard constraint the solver never changes.
    pub fn is_definite(self) -> bool {
        matches!(self, SegLabel::Foreground | SegLabel::Background)
    }
}

/// Row-major map of labels, one per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<SegLabel>,
}

impl LabelMap {
    /// Create a map with every pixel set to `label`.
    pub fn filled(width: u32, height: u32, label: SegLabel) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SegmenterError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            labels: vec![label; width as usize * height as usize],
        })
    }

    /// Map width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Label at a pixel.
    pub fn get(&self, x: u32, y: u32) -> SegLabel {
        self.labels[self.offset(x, y)]
    }

    /// Set the label at a pixel.
    pub fn set(&mut self, x: u32, y: u32, label: SegLabel) {
        let offset = self.offset(x, y);
        self.labels[offset] = label;
    }

    /// All labels in row-major order.
    pub fn labels(&self) -> &[SegLabel] {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [SegLabel] {
        &mut self.labels
    }

    /// Number of pixels carrying `label`.
    pub fn count(&self, label: SegLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Whether the map holds at least one pixel of each class.
    pub fn has_both_classes(&self) -> bool {
        let has_fg = self.labels.iter().any(|l| l.is_foreground());
        let has_bg = self.labels.iter().any(|l| !l.is_foreground());
        has_fg && has_bg
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Build the label map for a mask.
pub fn encode(mask: &RasterMask) -> LabelMap {
    let (width, height) = mask.dimensions();
    let mut labels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            labels.push(SegLabel::from_channel(Channel::dominant(mask.pixel(x, y))));
        }
    }
    LabelMap {
        width,
        height,
        labels,
    }
}

/// Build a mask from a label map.
pub fn decode(labels: &LabelMap) -> RasterMask {
    let width = labels.width as usize;
    let planes = Array3::from_shape_fn(
        (labels.height as usize, width, CHANNEL_COUNT),
        |(y, x, c)| labels.labels[y * width + x].channel().pixel_value()[c],
    );
    RasterMask::from_planes(planes)
}
