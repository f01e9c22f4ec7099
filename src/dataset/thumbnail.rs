// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Thumbnail generation

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;
use tracing::debug;

use crate::Result;

/// Bounding box of generated thumbnails (square)
pub const THUMBNAIL_SIZE: u32 = 128;

/// Decode `source`, shrink it to fit the thumbnail box and write it to
/// `destination` as JPEG. Returns the thumbnail dimensions.
///
/// The decoder is chosen from the file content; the extension is only a
/// fallback when the content is not recognised.
pub fn generate_thumbnail(source: &Path, destination: &Path) -> Result<(u32, u32)> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let (width, height) = img.dimensions();

    let thumbnail = fit_within(img, THUMBNAIL_SIZE);

    // JPEG has no alpha channel
    let thumbnail = DynamicImage::ImageRgb8(thumbnail.to_rgb8());
    thumbnail.save_with_format(destination, ImageFormat::Jpeg)?;

    let dims = thumbnail.dimensions();
    debug!("Thumbnail {}x{} -> {}x{}: {:?}", width, height, dims.0, dims.1, destination);
    Ok(dims)
}

/// Aspect-preserving shrink; images already inside the box are left alone
fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        img
    } else {
        img.resize(max, max, FilterType::Triangle)
    }
}
