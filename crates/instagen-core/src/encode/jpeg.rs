//! JPEG encoding for export.
//!
//! Uses the `image` crate's baseline JPEG encoder. Quality is the only knob
//! exposed; the optimizer drives it downward until a byte budget is met.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::SourceImage;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG carries no alpha; RGBA input must be flattened first
    #[error("Unsupported channel count {channels}: JPEG requires opaque RGB")]
    UnsupportedChannels { channels: usize },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1-100
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 65-90: Good quality, the usual range for feed exports
/// * Below 65: Visible artifacts on photographic content
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::with_capacity(expected_len / 8));

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode an opaque [`SourceImage`] to JPEG bytes.
///
/// RGBA images are rejected with `UnsupportedChannels`; flatten them first.
pub fn encode_image(image: &SourceImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if image.has_alpha {
        return Err(EncodeError::UnsupportedChannels {
            channels: image.channels(),
        });
    }
    encode_jpeg(&image.pixels, image.width, image.height, quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width) as u8);
                pixels.push((y * 255 / height) as u8);
                pixels.push(128);
            }
        }
        pixels
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let jpeg = encode_jpeg(&vec![128u8; 100 * 100 * 3], 100, 100, 90).unwrap();

        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let pixels = vec![128u8; 10 * 10 * 3];
        assert!(encode_jpeg(&pixels, 10, 10, 0).is_ok());
        assert!(encode_jpeg(&pixels, 10, 10, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let short = vec![128u8; 99 * 100 * 3];
        assert!(matches!(
            encode_jpeg(&short, 100, 100, 90),
            Err(EncodeError::InvalidPixelData { .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_zero_dimension() {
        assert!(matches!(
            encode_jpeg(&[], 0, 100, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_jpeg(&[], 100, 0, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_gradient_size_reasonable() {
        let jpeg = encode_jpeg(&gradient(100, 100), 100, 100, 90).unwrap();
        assert!(jpeg.len() > 500);
        assert!(jpeg.len() < 50_000);
    }

    #[test]
    fn test_encode_image_rejects_alpha() {
        let img = SourceImage::new_rgba(4, 4, vec![0u8; 4 * 4 * 4]);
        assert!(matches!(
            encode_image(&img, 90),
            Err(EncodeError::UnsupportedChannels { channels: 4 })
        ));
    }

    #[test]
    fn test_encode_image_rgb() {
        let img = SourceImage::new(20, 10, gradient(20, 10));
        let jpeg = encode_image(&img, 80).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
