//! Alpha flattening.
//!
//! Lossy encoders downstream have no transparency support, so RGBA pixels
//! are composited over an opaque background before encoding.

use super::SourceImage;

/// Solid white, the conventional flatten background.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Composite an image over an opaque background color.
///
/// Returns an RGB image (`has_alpha == false`). Opaque input is returned as
/// a clone.
pub fn flatten_alpha(image: &SourceImage, background: [u8; 3]) -> SourceImage {
    if !image.has_alpha {
        return image.clone();
    }

    let mut pixels = Vec::with_capacity(image.pixel_count() as usize * 3);
    for px in image.pixels.chunks_exact(4) {
        let alpha = px[3] as u32;
        for channel in 0..3 {
            pixels.push(blend(px[channel], background[channel], alpha));
        }
    }

    SourceImage {
        width: image.width,
        height: image.height,
        pixels,
        has_alpha: false,
    }
}

/// `fg * a + bg * (1 - a)` in 8-bit fixed point, rounded.
#[inline]
fn blend(fg: u8, bg: u8, alpha: u32) -> u8 {
    ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
}
