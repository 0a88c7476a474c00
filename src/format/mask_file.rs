//! Raw and PNG encodings of a [`RasterMask`].

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use ndarray::Array3;

use super::FormatError;
use crate::error::{Result, SegmenterError};
use crate::mask::{CHANNEL_COUNT, Channel, RasterMask};

/// Interleaved mask bytes in storage order (possible foreground, foreground,
/// background, possible background), row-major.
pub fn export_mask(mask: &RasterMask) -> Vec<u8> {
    mask.to_interleaved()
}

/// Rebuild a mask from [`export_mask`] bytes.
pub fn import_mask(buffer: &[u8], width: u32, height: u32) -> Result<RasterMask> {
    if width == 0 || height == 0 {
        return Err(SegmenterError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * CHANNEL_COUNT;
    if buffer.len() != expected {
        return Err(FormatError::BufferSizeMismatch {
            expected,
            actual: buffer.len(),
        }
        .into());
    }
    let planes = Array3::from_shape_vec(
        (height as usize, width as usize, CHANNEL_COUNT),
        buffer.to_vec(),
    )
    .map_err(|_| FormatError::BufferSizeMismatch {
        expected,
        actual: buffer.len(),
    })?;
    Ok(RasterMask::from_planes(planes))
}

/// Convert a mask to its on-disk RGBA layout.
pub fn mask_to_rgba(mask: &RasterMask) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let p = mask.pixel(x, y);
        Rgba([
            p[Channel::Background.index()],
            p[Channel::Foreground.index()],
            p[Channel::PossibleForeground.index()],
            p[Channel::PossibleBackground.index()],
        ])
    })
}

/// Convert an on-disk RGBA image back to a mask.
pub fn mask_from_rgba(image: &RgbaImage) -> Result<RasterMask> {
    let mut mask = RasterMask::new(image.width(), image.height())?;
    for (x, y, Rgba([r, g, b, a])) in image.enumerate_pixels() {
        let mut value = [0u8; CHANNEL_COUNT];
        value[Channel::Background.index()] = *r;
        value[Channel::Foreground.index()] = *g;
        value[Channel::PossibleForeground.index()] = *b;
        value[Channel::PossibleBackground.index()] = *a;
        mask.set_pixel(x, y, value);
    }
    Ok(mask)
}

/// Write a mask as an RGBA PNG.
pub fn save_mask_png(mask: &RasterMask, path: &Path) -> Result<()> {
    mask_to_rgba(mask)
        .save_with_format(path, ImageFormat::Png)
        .map_err(FormatError::from)?;
    log::info!("💾 Saved mask {:?}", path);
    Ok(())
}

/// Read a mask PNG, checking it matches the image size.
pub fn load_mask_png(path: &Path, width: u32, height: u32) -> Result<RasterMask> {
    let image = image::open(path).map_err(FormatError::from)?.to_rgba8();
    if image.dimensions() != (width, height) {
        return Err(FormatError::DimensionMismatch {
            path: path.to_path_buf(),
            expected_width: width,
            expected_height: height,
            found_width: image.width(),
            found_height: image.height(),
        }
        .into());
    }
    let mask = mask_from_rgba(&image)?;
    log::info!("📂 Loaded mask {:?}", path);
    Ok(mask)
}
