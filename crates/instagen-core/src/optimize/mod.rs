//! Size-bounded export optimization.
//!
//! Given a decoded image and a byte budget, [`SizeBoundedEncoder`] encodes,
//! measures and steps quality down (and, when the policy enables it, scales
//! dimensions down) until an encoding fits or the iteration cap is reached.
//!
//! # Modes
//!
//! - **Quality only** (`rescale_factor: None`): quality falls by
//!   `quality_step` per attempt and the loop stops once the next step would
//!   drop below `min_quality`.
//! - **Quality and rescale**: quality falls to a floor of 10 while both
//!   dimensions shrink by `rescale_factor` per attempt, floored at
//!   `min_dimension`. The loop runs until the budget is met or
//!   `max_iterations` encodes have been made.
//!
//! Budget misses return the last attempt with `met_budget == false`; only
//! invalid input and codec failures are errors.
//!
//! The loop is synchronous and keeps no state between calls. Deadlines and
//! worker pools belong to the caller.

mod encoder;
mod error;
mod policy;

pub use encoder::{optimize, optimize_bytes, OptimizationResult, SizeBoundedEncoder};
pub use error::OptimizeError;
pub use policy::{
    OptimizationPolicy, PolicyPreset, DEFAULT_TARGET_BYTES, QUALITY_FLOOR, RESCALE_QUALITY_FLOOR,
};
