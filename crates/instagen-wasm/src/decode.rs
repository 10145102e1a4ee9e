//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode a JPEG, PNG or WebP file from bytes
//! - [`resize_to_fit`] - Resize so the longest edge fits, preserving aspect ratio
//! - [`resize_for_web`] - Downscale to a web-friendly width with Lanczos3
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, resize_for_web } from '@instagen/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! const feed = resize_for_web(image, 1080);
//! console.log(`Feed image: ${feed.width}x${feed.height}`);
//! ```

use crate::types::{filter_from_u8, JsSourceImage};
use instagen_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an image from bytes.
///
/// The container is detected from content. EXIF orientation is applied and
/// transparency is kept for PNG/WebP inputs that carry it.
///
/// # Errors
///
/// Returns an error if the bytes are empty, not a supported format, or
/// corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsSourceImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsSourceImage::from_source)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Resize an image so its longest edge is at most `max_edge`.
///
/// # Arguments
///
/// * `image` - The source image
/// * `max_edge` - Maximum length of the longest edge
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
#[wasm_bindgen]
pub fn resize_to_fit(
    image: &JsSourceImage,
    max_edge: u32,
    filter: u8,
) -> Result<JsSourceImage, JsValue> {
    decode::resize_to_fit(&image.to_source(), max_edge, filter_from_u8(filter))
        .map(JsSourceImage::from_source)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Downscale an image to at most `max_width` pixels wide (Instagram uses 1080).
///
/// Images already narrower are returned unchanged.
#[wasm_bindgen]
pub fn resize_for_web(image: &JsSourceImage, max_width: u32) -> Result<JsSourceImage, JsValue> {
    decode::resize_for_web(&image.to_source(), max_width)
        .map(JsSourceImage::from_source)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}


/// WASM-specific tests that require JsValue.
///
/// Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_invalid_bytes() {
        assert!(decode_image(&[0u8, 1, 2, 3]).is_err());
        assert!(decode_image(&[]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_encoded_jpeg() {
        let jpeg =
            instagen_core::encode::encode_jpeg(&vec![100u8; 16 * 8 * 3], 16, 8, 90).unwrap();
        let image = decode_image(&jpeg).unwrap();
        assert_eq!((image.width(), image.height()), (16, 8));
        assert!(!image.has_alpha());
    }

    #[wasm_bindgen_test]
    fn test_resize_to_fit() {
        let img = JsSourceImage::new(400, 200, vec![0u8; 400 * 200 * 3]);
        let fitted = resize_to_fit(&img, 100, 2).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (100, 50));
    }
}
