//! Core types for decoded source images.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding and resampling operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The container format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Width or height is zero, or the pixel buffer does not match them.
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Resampling filter. The optimizer always uses `Lanczos3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Pixel copy; blocky on downscale.
    Nearest,
    /// Triangle filter.
    #[default]
    Bilinear,
    /// Windowed sinc; sharpest downscale.
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF `Orientation` tag (values 1-8). Unknown values read as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Mirrored, then rotated 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Mirrored, then rotated 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded raster image.
///
/// Pixels are 8-bit, row-major. Opaque images carry 3 channels (RGB); images
/// with an alpha channel carry 4 (RGBA). The optimizer never mutates a
/// `SourceImage`; every transform returns a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * channels()` bytes.
    pub pixels: Vec<u8>,
    /// Whether `pixels` is RGBA rather than RGB.
    pub has_alpha: bool,
}

impl SourceImage {
    /// Create an opaque RGB image.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
            has_alpha: false,
        }
    }

    /// Create an RGBA image.
    pub fn new_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
            has_alpha: true,
        }
    }

    /// Convert a decoded `DynamicImage`, keeping alpha only when the source
    /// color type has it.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            Self::from_rgba_image(img.into_rgba8())
        } else {
            Self::from_rgb_image(img.into_rgb8())
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
            has_alpha: false,
        }
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
            has_alpha: true,
        }
    }

    /// View as an `RgbImage`. `None` for RGBA images or a mismatched buffer.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.has_alpha {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// View as an `RgbaImage`. `None` for RGB images or a mismatched buffer.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        if !self.has_alpha {
            return None;
        }
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Bytes per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        if self.has_alpha {
            4
        } else {
            3
        }
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// True when the buffer length agrees with the dimensions and channel count.
    pub fn is_well_formed(&self) -> bool {
        !self.is_empty()
            && self.pixels.len() == (self.width as usize) * (self.height as usize) * self.channels()
    }

    /// True if any pixel is less than fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.has_alpha && self.pixels.chunks_exact(4).any(|px| px[3] < u8::MAX)
    }
}
