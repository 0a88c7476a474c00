//! Four-plane raster mask holding the segmentation state of one image.
//!
//! Planes are interleaved per pixel in the order possible foreground,
//! foreground, background, possible background. The last plane is stored
//! inverted: it is the coverage of the other three, so an unpainted pixel
//! (all zero) reads as possible background. This is also the byte order
//! used by [`crate::format::export_mask`].

use image::{Rgba, RgbaImage};
use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};

use crate::error::{Result, SegmenterError};

/// Number of planes in a mask.
pub const CHANNEL_COUNT: usize = 4;

/// One plane of a [`RasterMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Possibly foreground (painted blue)
    PossibleForeground,
    /// Definitely foreground (painted green)
    Foreground,
    /// Definitely background (painted red)
    Background,
    /// Possibly background, the unpainted default (stored inverted)
    PossibleBackground,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::PossibleForeground,
        Channel::Foreground,
        Channel::Background,
        Channel::PossibleBackground,
    ];

    /// Index of this plane within a pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::PossibleForeground => 0,
            Channel::Foreground => 1,
            Channel::Background => 2,
            Channel::PossibleBackground => 3,
        }
    }

    /// Display name for this channel.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::PossibleForeground => "Possible Foreground",
            Channel::Foreground => "Foreground",
            Channel::Background => "Background",
            Channel::PossibleBackground => "Possible Background",
        }
    }

    /// Pixel value written when a pixel is claimed by this channel.
    ///
    /// Possible background is the transparent pixel, so writing it is an erase.
    pub fn pixel_value(self) -> [u8; CHANNEL_COUNT] {
        match self {
            Channel::PossibleForeground => [255, 0, 0, 255],
            Channel::Foreground => [0, 255, 0, 255],
            Channel::Background => [0, 0, 255, 255],
            Channel::PossibleBackground => [0, 0, 0, 0],
        }
    }

    /// Channel a pixel belongs to when several planes are set.
    ///
    /// Definite labels beat probable ones and foreground beats background.
    /// A pixel with none of the three colour planes set is possible background,
    /// whatever its coverage plane holds.
    pub fn dominant(pixel: [u8; CHANNEL_COUNT]) -> Channel {
        if pixel[Channel::Foreground.index()] != 0 {
            Channel::Foreground
        } else if pixel[Channel::Background.index()] != 0 {
            Channel::Background
        } else if pixel[Channel::PossibleForeground.index()] != 0 {
            Channel::PossibleForeground
        } else {
            Channel::PossibleBackground
        }
    }
}

/// Overlay colours used by [`RasterMask::composite_for_display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMap {
    /// RGB for definite foreground
    pub foreground: [u8; 3],
    /// RGB for possible foreground
    pub possible_foreground: [u8; 3],
    /// RGB for definite background
    pub background: [u8; 3],
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            foreground: [0, 255, 0],
            possible_foreground: [0, 0, 255],
            background: [255, 0, 0],
        }
    }
}

impl ColorMap {
    /// Overlay colour for a channel; possible background is never drawn.
    pub fn color_for(&self, channel: Channel) -> Option<[u8; 3]> {
        match channel {
            Channel::Foreground => Some(self.foreground),
            Channel::PossibleForeground => Some(self.possible_foreground),
            Channel::Background => Some(self.background),
            Channel::PossibleBackground => None,
        }
    }
}

/// In-memory segmentation mask, `height x width x 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterMask {
    planes: Array3<u8>,
}

impl RasterMask {
    /// Create a blank mask (every pixel possible background).
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SegmenterError::InvalidDimensions { width, height });
        }
        Ok(Self {
            planes: Array3::zeros((height as usize, width as usize, CHANNEL_COUNT)),
        })
    }

    /// Wrap an already-shaped plane array. The caller guarantees non-zero sides.
    pub(crate) fn from_planes(planes: Array3<u8>) -> Self {
        Self { planes }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.planes.dim().1 as u32
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.planes.dim().0 as u32
    }

    /// Mask dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Check whether integer pixel coordinates fall inside the mask.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height())
    }

    /// All four plane values of a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; CHANNEL_COUNT] {
        let (x, y) = (x as usize, y as usize);
        [
            self.planes[[y, x, 0]],
            self.planes[[y, x, 1]],
            self.planes[[y, x, 2]],
            self.planes[[y, x, 3]],
        ]
    }

    /// Overwrite all four plane values of a pixel.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; CHANNEL_COUNT]) {
        let (x, y) = (x as usize, y as usize);
        for (c, v) in value.into_iter().enumerate() {
            self.planes[[y, x, c]] = v;
        }
    }

    /// Value of one plane at a pixel.
    pub fn value(&self, channel: Channel, x: u32, y: u32) -> u8 {
        self.planes[[y as usize, x as usize, channel.index()]]
    }

    /// Read-only `height x width` view of one plane.
    pub fn channel(&self, channel: Channel) -> ArrayView2<'_, u8> {
        self.planes.index_axis(Axis(2), channel.index())
    }

    /// Mutable `height x width` view of one plane.
    pub fn channel_mut(&mut self, channel: Channel) -> ArrayViewMut2<'_, u8> {
        self.planes.index_axis_mut(Axis(2), channel.index())
    }

    /// Check whether any pixel has a non-zero value in the given plane.
    pub fn has_coverage(&self, channel: Channel) -> bool {
        self.channel(channel).iter().any(|&v| v != 0)
    }

    /// Check whether every plane is zero.
    pub fn is_blank(&self) -> bool {
        self.planes.iter().all(|&v| v == 0)
    }

    /// Interleaved bytes in storage order, row-major.
    pub fn to_interleaved(&self) -> Vec<u8> {
        self.planes.iter().copied().collect()
    }

    /// Build the RGBA overlay shown on top of the image.
    ///
    /// Each pixel takes the colour of its dominant channel with alpha scaled
    /// by the coverage plane and `opacity` (clamped to 0.0 - 1.0).
    pub fn composite_for_display(&self, colors: &ColorMap, opacity: f32) -> RgbaImage {
        let opacity = opacity.clamp(0.0, 1.0);
        RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let pixel = self.pixel(x, y);
            match colors.color_for(Channel::dominant(pixel)) {
                Some([r, g, b]) => {
                    let coverage = f32::from(pixel[Channel::PossibleBackground.index()]);
                    Rgba([r, g, b, (coverage * opacity).round() as u8])
                }
                None => Rgba([0, 0, 0, 0]),
            }
        })
    }
}
