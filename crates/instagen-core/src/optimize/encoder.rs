//! The size-bounded encode loop.

use std::borrow::Cow;

use tracing::{debug, info, warn};

use super::{OptimizationPolicy, OptimizeError};
use crate::codec::{ImageCodec, JpegCodec};
use crate::decode::{FilterType, SourceImage};

/// Outcome of one optimization call.
///
/// `met_budget == false` is a best-effort result: the last encode attempted,
/// still at or above `target_bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationResult {
    /// Encoded lossy raster bytes.
    pub bytes: Vec<u8>,
    /// Quality the returned bytes were encoded at.
    pub quality: u8,
    /// Width of the returned encoding.
    pub width: u32,
    /// Height of the returned encoding.
    pub height: u32,
    /// Loop counter at exit: 0 when the first encode met the budget,
    /// otherwise the number of attempts that missed it.
    pub iterations: u32,
    /// Encodes performed, never more than `max_iterations`.
    pub attempts: u32,
    /// Whether `bytes.len()` is strictly below the target.
    pub met_budget: bool,
}

impl OptimizationResult {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Shrinks an image below a byte budget by stepping quality (and optionally
/// dimensions) down until an encode fits or the iteration cap is hit.
///
/// Stateless between calls; one encoder may serve concurrent callers as
/// long as its codec is `Sync`.
#[derive(Debug, Clone, Default)]
pub struct SizeBoundedEncoder<C = JpegCodec> {
    codec: C,
}

impl SizeBoundedEncoder<JpegCodec> {
    pub fn jpeg() -> Self {
        Self { codec: JpegCodec }
    }
}

impl<C: ImageCodec> SizeBoundedEncoder<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Optimize `image` under `policy`.
    ///
    /// The first encode whose size is strictly below `target_bytes` wins and
    /// ends the loop, even if more headroom exists. Missing the budget is
    /// reported through `met_budget`, not as an error.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a policy that fails validation or an empty or
    /// malformed image; `Codec` as soon as any encode/resize fails.
    pub fn optimize(
        &self,
        image: &SourceImage,
        policy: &OptimizationPolicy,
    ) -> Result<OptimizationResult, OptimizeError> {
        policy.validate()?;
        if !image.is_well_formed() {
            return Err(OptimizeError::invalid(format!(
                "image must have positive dimensions and a matching pixel buffer \
                 (got {}x{}, {} bytes)",
                image.width,
                image.height,
                image.pixels.len()
            )));
        }

        let base: Cow<'_, SourceImage> = if image.has_alpha {
            Cow::Owned(self.codec.flatten_alpha(image, policy.background)?)
        } else {
            Cow::Borrowed(image)
        };

        self.run(&base, policy)
    }

    fn run(
        &self,
        base: &SourceImage,
        policy: &OptimizationPolicy,
    ) -> Result<OptimizationResult, OptimizeError> {
        let mut working: Cow<'_, SourceImage> = Cow::Borrowed(base);
        let mut quality = policy.start_quality;
        let mut iteration = 0u32;
        let mut last = None;

        while iteration < policy.max_iterations {
            let bytes = self.codec.encode(&working, quality)?;
            let size = bytes.len() as u64;

            debug!(
                iteration,
                quality,
                width = working.width,
                height = working.height,
                size,
                target = policy.target_bytes,
                "encode attempt"
            );

            let attempt = OptimizationResult {
                bytes,
                quality,
                width: working.width,
                height: working.height,
                iterations: iteration,
                attempts: iteration + 1,
                met_budget: size < policy.target_bytes,
            };

            if attempt.met_budget {
                info!(
                    size,
                    quality,
                    width = attempt.width,
                    height = attempt.height,
                    attempts = attempt.attempts,
                    "image fits byte budget"
                );
                return Ok(attempt);
            }

            last = Some(attempt);
            iteration += 1;
            if iteration >= policy.max_iterations {
                break;
            }

            let Some(next) = policy.next_quality(quality) else {
                debug!(quality, "quality range exhausted");
                break;
            };
            quality = next;

            if let Some(factor) = policy.rescale_factor {
                let (width, height) = scaled_dimensions(
                    working.width,
                    working.height,
                    factor,
                    policy.min_dimension,
                );
                if (width, height) != (working.width, working.height) {
                    // Resample from the full-size base so blur does not compound.
                    working = Cow::Owned(self.codec.resize(
                        base,
                        width,
                        height,
                        FilterType::Lanczos3,
                    )?);
                }
            }
        }

        let mut result =
            last.ok_or_else(|| OptimizeError::invalid("max_iterations must be positive"))?;
        result.iterations = iteration;

        warn!(
            size = result.bytes.len(),
            target = policy.target_bytes,
            quality = result.quality,
            width = result.width,
            height = result.height,
            attempts = result.attempts,
            "could not reach byte budget, returning best effort"
        );
        Ok(result)
    }
}

/// Optimize with the production JPEG codec.
pub fn optimize(
    image: &SourceImage,
    policy: &OptimizationPolicy,
) -> Result<OptimizationResult, OptimizeError> {
    SizeBoundedEncoder::jpeg().optimize(image, policy)
}

/// Decode container bytes, then optimize.
///
/// The input's own byte count is never trusted: even a file already under
/// budget is decoded and re-encoded at least once.
pub fn optimize_bytes(
    bytes: &[u8],
    policy: &OptimizationPolicy,
) -> Result<OptimizationResult, OptimizeError> {
    policy.validate()?;
    let image = crate::decode::decode_image(bytes)?;
    optimize(&image, policy)
}

/// Scale both dimensions by `factor`, each floored at `min_dimension` and
/// never enlarged. The floor applies per axis, so aspect ratio can drift
/// once one side bottoms out.
fn scaled_dimensions(width: u32, height: u32, factor: f64, min_dimension: u32) -> (u32, u32) {
    let scale = |d: u32| ((d as f64 * factor) as u32).max(min_dimension).min(d);
    (scale(width), scale(height))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::codec::CodecError;
    use crate::decode;
    use crate::optimize::QUALITY_FLOOR;
    use proptest::prelude::*;
    use std::cell::Cell;

    /// Size shrinks with both quality and pixel count; counts encodes.
    #[derive(Default)]
    struct CountingModel {
        encodes: Cell<u32>,
    }

    impl ImageCodec for CountingModel {
        fn encode(&self, image: &SourceImage, quality: u8) -> Result<Vec<u8>, CodecError> {
            self.encodes.set(self.encodes.get() + 1);
            let len = image.pixel_count() * quality as u64 / 16 + 1;
            Ok(vec![0; len as usize])
        }

        fn resize(
            &self,
            image: &SourceImage,
            width: u32,
            height: u32,
            filter: FilterType,
        ) -> Result<SourceImage, CodecError> {
            Ok(decode::resize(image, width, height, filter)?)
        }

        fn flatten_alpha(
            &self,
            image: &SourceImage,
            background: [u8; 3],
        ) -> Result<SourceImage, CodecError> {
            Ok(decode::flatten_alpha(image, background))
        }
    }

    fn policy_strategy() -> impl Strategy<Value = OptimizationPolicy> {
        (
            1u64..=20_000,
            20u8..=100,
            1u8..=20,
            1u32..=25,
            proptest::option::of(0.3f64..0.99),
            1u32..=40,
        )
            .prop_flat_map(|(target, start, step, max_iter, rescale, min_dim)| {
                (1u8..start).prop_map(move |min_quality| OptimizationPolicy {
                    target_bytes: target,
                    start_quality: start,
                    min_quality,
                    quality_step: step,
                    max_iterations: max_iter,
                    rescale_factor: rescale,
                    min_dimension: min_dim,
                    ..OptimizationPolicy::default()
                })
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Bounded runtime and an honest `met_budget` flag.
        #[test]
        fn prop_terminates_within_max_iterations(
            policy in policy_strategy(),
            (width, height) in (1u32..=64, 1u32..=64),
        ) {
            let codec = CountingModel::default();
            let image = SourceImage::new(width, height, vec![90u8; (width * height * 3) as usize]);

            let result = SizeBoundedEncoder::new(&codec).optimize(&image, &policy).unwrap();

            prop_assert!(codec.encodes.get() <= policy.max_iterations);
            prop_assert_eq!(codec.encodes.get(), result.attempts);
            prop_assert_eq!(result.met_budget, (result.len() as u64) < policy.target_bytes);
            prop_assert!(result.width <= width && result.height <= height);
        }

        /// When the start quality already fits, nothing else is tried.
        #[test]
        fn prop_fits_at_start_returns_immediately(
            policy in policy_strategy(),
            side in 1u32..=32,
        ) {
            let image = SourceImage::new(side, side, vec![0u8; (side * side * 3) as usize]);
            let start_len = image.pixel_count() * policy.start_quality as u64 / 16 + 1;
            prop_assume!(start_len < policy.target_bytes);

            let result = SizeBoundedEncoder::new(CountingModel::default())
                .optimize(&image, &policy)
                .unwrap();

            prop_assert!(result.met_budget);
            prop_assert_eq!(result.quality, policy.start_quality);
            prop_assert_eq!(result.iterations, 0);
        }

        /// A budget reachable at `min_quality` in quality-only mode is always met.
        #[test]
        fn prop_reachable_budget_is_met(
            policy in policy_strategy(),
            side in 1u32..=32,
        ) {
            let policy = OptimizationPolicy {
                rescale_factor: None,
                max_iterations: 100,
                quality_step: 1,
                ..policy
            };
            let image = SourceImage::new(side, side, vec![0u8; (side * side * 3) as usize]);
            let floor = policy.min_quality.max(QUALITY_FLOOR);
            let floor_len = image.pixel_count() * floor as u64 / 16 + 1;
            prop_assume!(floor_len < policy.target_bytes);

            let result = SizeBoundedEncoder::new(CountingModel::default())
                .optimize(&image, &policy)
                .unwrap();

            prop_assert!(result.met_budget);
            prop_assert!((result.len() as u64) < policy.target_bytes);
        }
    }
}
