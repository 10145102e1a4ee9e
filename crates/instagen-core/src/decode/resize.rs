//! Image resampling.
//!
//! All functions return new `SourceImage` instances without modifying the
//! input. RGB and RGBA images are both supported; the channel layout of the
//! output matches the input.

use super::{DecodeError, FilterType, SourceImage};

/// Default maximum width for web/Instagram delivery.
pub const WEB_MAX_WIDTH: u32 = 1080;

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` if either target dimension is
/// zero, and `DecodeError::CorruptedFile` if the source buffer does not
/// match its declared dimensions.
pub fn resize(
    image: &SourceImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<SourceImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let filter = filter.to_image_filter();
    let corrupted = || DecodeError::CorruptedFile("Pixel buffer does not match dimensions".to_string());

    if image.has_alpha {
        let rgba = image.to_rgba_image().ok_or_else(corrupted)?;
        let resized = image::imageops::resize(&rgba, width, height, filter);
        Ok(SourceImage::from_rgba_image(resized))
    } else {
        let rgb = image.to_rgb_image().ok_or_else(corrupted)?;
        let resized = image::imageops::resize(&rgb, width, height, filter);
        Ok(SourceImage::from_rgb_image(resized))
    }
}

/// Resize an image to fit within a maximum edge length while preserving
/// aspect ratio. Images already within bounds are returned unchanged.
pub fn resize_to_fit(
    image: &SourceImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<SourceImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Downscale an image so its width is at most `max_width`, using Lanczos3.
///
/// Only width is constrained; tall images keep their full height ratio.
/// Narrower images are returned unchanged.
pub fn resize_for_web(image: &SourceImage, max_width: u32) -> Result<SourceImage, DecodeError> {
    if max_width == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: 0,
            height: image.height,
        });
    }

    if image.width <= max_width {
        return Ok(image.clone());
    }

    let ratio = max_width as f64 / image.width as f64;
    let new_height = ((image.height as f64 * ratio) as u32).max(1);
    resize(image, max_width, new_height, FilterType::Lanczos3)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
