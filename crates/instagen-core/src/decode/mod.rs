//! Source image decoding and pixel-level helpers.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP containers into a [`SourceImage`]
//! - Applying EXIF orientation so pixels come out upright
//! - Resampling (exact, fit-to-edge, web width)
//! - Flattening alpha onto an opaque background
//!
//! All operations are synchronous and allocate fresh output; inputs are
//! never modified.

mod alpha;
mod container;
mod resize;
mod types;

pub use alpha::{flatten_alpha, WHITE};
pub use container::{decode_image, get_orientation};
pub use resize::{resize, resize_for_web, resize_to_fit, WEB_MAX_WIDTH};
pub use types::{DecodeError, FilterType, Orientation, SourceImage};
