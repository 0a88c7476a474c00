//! Content-sniffed image discovery and loading.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};

use super::FormatError;
use crate::error::Result;

/// Image encodings accepted by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

/// Detect the image kind from leading bytes.
pub fn sniff_image_kind(data: &[u8]) -> Option<ImageKind> {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageKind::Png);
    }
    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageKind::Jpeg);
    }
    None
}

fn sniff_file(path: &Path) -> std::io::Result<Option<ImageKind>> {
    let mut header = [0u8; 8];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(sniff_image_kind(&header[..filled]))
}

/// Files directly inside `dir` whose content is PNG or JPEG, sorted by path.
///
/// Subdirectories and files that cannot be read are skipped.
pub fn list_readable_image_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(FormatError::from)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| match sniff_file(path) {
            Ok(kind) => kind.is_some(),
            Err(e) => {
                log::warn!("Skipping unreadable file {:?}: {}", path, e);
                false
            }
        })
        .collect();

    images.sort();
    log::info!("Scanned {:?}: found {} images", dir, images.len());
    Ok(images)
}

/// Decode an image file to RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    if sniff_file(path).map_err(FormatError::from)?.is_none() {
        return Err(FormatError::UnsupportedImage {
            path: path.to_path_buf(),
        }
        .into());
    }
    let image = ImageReader::open(path)
        .map_err(FormatError::from)?
        .with_guessed_format()
        .map_err(FormatError::from)?
        .decode()
        .map_err(FormatError::from)?
        .to_rgb8();
    log::info!("📂 Loaded image {:?} ({}x{})", path, image.width(), image.height());
    Ok(image)
}
