//! Size-bounded export WASM bindings.
//!
//! The browser export flow hands a decoded image (or raw file bytes) and a
//! policy object to these functions and gets back JPEG bytes that fit the
//! upload limit, or the best effort when the limit cannot be reached.
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, optimize_image } from '@instagen/wasm';
//!
//! const image = decode_image(bytes);
//! const result = optimize_image(image, { preset: 'export', targetBytes: 300_000 });
//! if (!result.metBudget) {
//!   showWarning(`Export is ${result.byteLength} bytes at quality ${result.quality}`);
//! }
//! const blob = new Blob([result.bytes()], { type: 'image/jpeg' });
//! ```

use crate::types::JsSourceImage;
use instagen_core::decode::SourceImage;
use instagen_core::optimize::{
    self, OptimizationPolicy, OptimizationResult, OptimizeError, PolicyPreset,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Policy object accepted from JavaScript.
///
/// Every field is optional. `preset` picks the starting point (retail when
/// absent) and the remaining fields override it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct JsPolicyOptions {
    pub preset: Option<PolicyPreset>,
    pub target_bytes: Option<u64>,
    /// Convenience for `targetBytes = targetKb * 1024`; ignored when
    /// `targetBytes` is also given.
    pub target_kb: Option<u64>,
    pub start_quality: Option<u8>,
    pub min_quality: Option<u8>,
    pub quality_step: Option<u8>,
    pub max_iterations: Option<u32>,
    pub rescale_factor: Option<f64>,
    pub min_dimension: Option<u32>,
    pub background: Option<[u8; 3]>,
    /// Turn off rescaling, e.g. on top of the export-rescale preset.
    pub no_rescale: Option<bool>,
}

impl JsPolicyOptions {
    pub fn into_policy(self) -> OptimizationPolicy {
        let mut policy = OptimizationPolicy::preset(self.preset.unwrap_or_default());

        if let Some(kb) = self.target_kb {
            policy = policy.with_target_kb(kb);
        }
        if let Some(bytes) = self.target_bytes {
            policy.target_bytes = bytes;
        }
        if let Some(q) = self.start_quality {
            policy.start_quality = q;
        }
        if let Some(q) = self.min_quality {
            policy.min_quality = q;
        }
        if let Some(step) = self.quality_step {
            policy.quality_step = step;
        }
        if let Some(n) = self.max_iterations {
            policy.max_iterations = n;
        }
        if let Some(factor) = self.rescale_factor {
            policy.rescale_factor = Some(factor);
        }
        if let Some(min) = self.min_dimension {
            policy.min_dimension = min;
        }
        if let Some(bg) = self.background {
            policy.background = bg;
        }
        if self.no_rescale == Some(true) {
            policy = policy.without_rescale();
        }
        policy
    }
}

/// Optimization outcome accessible from JavaScript.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsOptimizationResult {
    bytes: Vec<u8>,
    quality: u8,
    width: u32,
    height: u32,
    iterations: u32,
    attempts: u32,
    met_budget: bool,
}

#[wasm_bindgen]
impl JsOptimizationResult {
    /// Encoded JPEG bytes as Uint8Array (a copy).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[wasm_bindgen(getter)]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// False when the bytes are a best effort still over the target.
    #[wasm_bindgen(getter = metBudget)]
    pub fn met_budget(&self) -> bool {
        self.met_budget
    }
}

impl From<OptimizationResult> for JsOptimizationResult {
    fn from(result: OptimizationResult) -> Self {
        Self {
            bytes: result.bytes,
            quality: result.quality,
            width: result.width,
            height: result.height,
            iterations: result.iterations,
            attempts: result.attempts,
            met_budget: result.met_budget,
        }
    }
}

/// Optimize a decoded image under a policy object.
///
/// # Arguments
///
/// * `image` - The decoded source image (RGB or RGBA)
/// * `policy` - A `JsPolicyOptions` object, or `undefined` for the retail preset
///
/// # Errors
///
/// Returns an error for a malformed policy, an empty image, or a codec
/// failure. Missing the budget is not an error; check `metBudget`.
#[wasm_bindgen]
pub fn optimize_image(
    image: &JsSourceImage,
    policy: JsValue,
) -> Result<JsOptimizationResult, JsValue> {
    let options: JsPolicyOptions = if policy.is_undefined() || policy.is_null() {
        JsPolicyOptions::default()
    } else {
        serde_wasm_bindgen::from_value(policy).map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    run_optimize(&image.to_source(), &options.into_policy())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode file bytes and optimize them with a named preset.
///
/// # Arguments
///
/// * `bytes` - JPEG, PNG or WebP file bytes
/// * `preset` - `"retail"`, `"export"` or `"export-rescale"`; retail when omitted
#[wasm_bindgen]
pub fn optimize_export(
    bytes: &[u8],
    preset: Option<String>,
) -> Result<JsOptimizationResult, JsValue> {
    export_with_preset(bytes, preset.as_deref()).map_err(|e| JsValue::from_str(&e.to_string()))
}

pub(crate) fn export_with_preset(
    bytes: &[u8],
    preset: Option<&str>,
) -> Result<JsOptimizationResult, OptimizeError> {
    let preset = match preset {
        Some(name) => name.parse::<PolicyPreset>()?,
        None => PolicyPreset::default(),
    };
    let policy = OptimizationPolicy::preset(preset);
    let result = optimize::optimize_bytes(bytes, &policy)?;
    report(&result, &policy);
    Ok(result.into())
}

pub(crate) fn run_optimize(
    image: &SourceImage,
    policy: &OptimizationPolicy,
) -> Result<JsOptimizationResult, OptimizeError> {
    let result = optimize::optimize(image, policy)?;
    report(&result, policy);
    Ok(result.into())
}

fn report(result: &OptimizationResult, policy: &OptimizationPolicy) {
    if !result.met_budget {
        console_warn(&budget_miss_message(result, policy));
    }
}

fn budget_miss_message(result: &OptimizationResult, policy: &OptimizationPolicy) -> String {
    format!(
        "instagen: could not get under {} bytes; returning {} bytes at quality {} ({}x{})",
        policy.target_bytes,
        result.len(),
        result.quality,
        result.width,
        result.height
    )
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

// Host builds have no browser console; the core already logs through tracing.
#[cfg(not(target_arch = "wasm32"))]
fn console_warn(_message: &str) {}
