//! The image-codec capability the optimizer depends on.
//!
//! [`SizeBoundedEncoder`](crate::optimize::SizeBoundedEncoder) never touches
//! the `image` crate directly; it drives an [`ImageCodec`]. [`JpegCodec`] is
//! the production implementation. Tests substitute codecs with a known size
//! model so large-image scenarios run without encoding megapixels.

use thiserror::Error;

use crate::decode::{self, DecodeError, FilterType, SourceImage};
use crate::encode::{self, EncodeError};

/// Failure reported by the underlying codec.
///
/// Never retried with different parameters: a codec failure is not
/// generally recoverable by changing quality.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Encode, resample and flatten operations on decoded images.
pub trait ImageCodec {
    /// Encode an opaque image to lossy raster bytes at `quality` (1-100).
    fn encode(&self, image: &SourceImage, quality: u8) -> Result<Vec<u8>, CodecError>;

    /// Resample to exactly `width` x `height`.
    fn resize(
        &self,
        image: &SourceImage,
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<SourceImage, CodecError>;

    /// Composite alpha over an opaque background, producing RGB.
    fn flatten_alpha(
        &self,
        image: &SourceImage,
        background: [u8; 3],
    ) -> Result<SourceImage, CodecError>;
}

/// Baseline JPEG via the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl ImageCodec for JpegCodec {
    fn encode(&self, image: &SourceImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        Ok(encode::encode_image(image, quality)?)
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

impl<C: ImageCodec + ?Sized> ImageCodec for &C {
    fn encode(&self, image: &SourceImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        (**self).encode(image, quality)
    }

    fn resize(
        &self,
        image: &SourceImage,
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<SourceImage, CodecError> {
        (**self).resize(image, width, height, filter)
    }

    fn flatten_alpha(
        &self,
        image: &SourceImage,
        background: [u8; 3],
    ) -> Result<SourceImage, CodecError> {
        (**self).flatten_alpha(image, background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_codec_encode() {
        let img = SourceImage::new(8, 8, vec![100u8; 8 * 8 * 3]);
        let bytes = JpegCodec.encode(&img, 90).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_codec_encode_alpha_is_codec_error() {
        let img = SourceImage::new_rgba(8, 8, vec![100u8; 8 * 8 * 4]);
        let err = JpegCodec.encode(&img, 90).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Encode(EncodeError::UnsupportedChannels { .. })
        ));
    }

    #[test]
    fn test_jpeg_codec_resize_and_flatten() {
        let img = SourceImage::new_rgba(10, 10, vec![0u8; 10 * 10 * 4]);
        let flat = JpegCodec.flatten_alpha(&img, [255, 255, 255]).unwrap();
        assert!(!flat.has_alpha);

        let small = JpegCodec.resize(&flat, 5, 4, FilterType::Lanczos3).unwrap();
        assert_eq!((small.width, small.height), (5, 4));
    }

    #[test]
    fn test_jpeg_codec_resize_error_propagates() {
        let img = SourceImage::new(10, 10, vec![0u8; 300]);
        let err = JpegCodec.resize(&img, 0, 4, FilterType::Nearest).unwrap_err();
        assert!(matches!(err, CodecError::Decode(DecodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_codec_error_display_is_transparent() {
        let err = CodecError::from(EncodeError::EncodingFailed("boom".to_string()));
        assert_eq!(err.to_string(), "JPEG encoding failed: boom");
    }
}
