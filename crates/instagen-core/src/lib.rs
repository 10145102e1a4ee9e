//! Instagen Core - size-bounded image export
//!
//! This crate turns decoded photos into JPEG files that fit a byte budget,
//! stepping quality down (and optionally shrinking dimensions) until the
//! encoded output is small enough for upload limits.
//!
//! # Module Structure
//!
//! - `decode` - Container decoding, EXIF orientation, resampling, alpha flattening
//! - `encode` - Baseline JPEG encoding
//! - `codec` - The codec capability the optimizer drives
//! - `optimize` - Policies, presets and the size-bounded encoder
//! - `palette` - Dominant color extraction

pub mod codec;
pub mod decode;
pub mod encode;
pub mod optimize;
pub mod palette;

pub use codec::{CodecError, ImageCodec, JpegCodec};
pub use decode::{decode_image, DecodeError, FilterType, SourceImage};
pub use encode::EncodeError;
pub use optimize::{
    optimize, optimize_bytes, OptimizationPolicy, OptimizationResult, OptimizeError,
    PolicyPreset, SizeBoundedEncoder,
};
pub use palette::{dominant_colors, hex_palette, to_hex};
