//! Dominant color WASM bindings.

use crate::types::JsSourceImage;
use instagen_core::palette;
use wasm_bindgen::prelude::*;

/// Extract up to `count` dominant colors as `#RRGGBB` strings, most common first.
///
/// # Example (TypeScript)
/// ```typescript
/// const swatches: string[] = extract_palette(image, 4);
/// ```
#[wasm_bindgen]
pub fn extract_palette(image: &JsSourceImage, count: usize) -> js_sys::Array {
    palette_strings(image, count)
        .into_iter()
        .map(|hex| JsValue::from_str(&hex))
        .collect()
}

pub(crate) fn palette_strings(image: &JsSourceImage, count: usize) -> Vec<String> {
    palette::hex_palette(&image.to_source(), count)
}
