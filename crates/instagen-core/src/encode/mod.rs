//! Image encoding for export.
//!
//! Only baseline JPEG is produced: it is the lossy raster format the
//! size-bounded optimizer steps down through.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError};
