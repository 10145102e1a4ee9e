//! Instagen WASM - WebAssembly bindings for Instagen
//!
//! This crate exposes the instagen-core export pipeline to the browser so
//! images can be shrunk under upload limits before they leave the device.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Decoding and resizing bindings
//! - `optimize` - Size-bounded JPEG export
//! - `palette` - Dominant color extraction
//!
//! # Usage
//!
//! ```typescript
//! import init, { optimize_export } from '@instagen/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = optimize_export(bytes, 'export');
//! console.log(`${result.byteLength} bytes at quality ${result.quality}`);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod optimize;
mod palette;
mod types;

pub use decode::{decode_image, resize_for_web, resize_to_fit};
pub use optimize::{optimize_export, optimize_image, JsOptimizationResult, JsPolicyOptions};
pub use palette::extract_palette;
pub use types::JsSourceImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Names accepted by `optimize_export`.
#[wasm_bindgen]
pub fn preset_names() -> Vec<String> {
    instagen_core::PolicyPreset::ALL
        .iter()
        .map(|preset| preset.name().to_string())
        .collect()
}
