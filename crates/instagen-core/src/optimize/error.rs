//! Error taxonomy for size-bounded optimization.
//!
//! Missing the byte budget is not an error: it is reported through
//! `OptimizationResult::met_budget`.

use thiserror::Error;

use crate::codec::CodecError;
use crate::decode::DecodeError;
use crate::encode::EncodeError;

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Malformed policy or empty/zero-dimension image. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Encode, decode or resample failure from the codec.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl OptimizeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        OptimizeError::InvalidArgument(message.into())
    }
}

impl From<DecodeError> for OptimizeError {
    fn from(err: DecodeError) -> Self {
        OptimizeError::Codec(CodecError::Decode(err))
    }
}

impl From<EncodeError> for OptimizeError {
    fn from(err: EncodeError) -> Self {
        OptimizeError::Codec(CodecError::Encode(err))
    }
}
