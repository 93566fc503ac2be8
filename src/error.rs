//! Error type for FLIP operations.
//!
//! Every failure in this crate is a caller programming error: nothing here
//! does I/O, so nothing is transient or worth retrying. The two saturating
//! policies (histogram bucket clamping and channel clamping on encode) are
//! not errors and never surface here.

use thiserror::Error;

/// Error type for FLIP operations.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FlipError {
    /// Width or height is zero.
    #[error("invalid dimensions: {width}x{height} (both must be non-zero)")]
    InvalidDimensions {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },

    /// Two operands of a binary operation have different sizes.
    #[error("image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")]
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },

    /// Pixel coordinate outside the image.
    #[error("pixel ({x}, {y}) out of bounds for {width}x{height} image")]
    PixelOutOfBounds {
        /// Column requested.
        x: usize,
        /// Row requested.
        y: usize,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },

    /// Histogram bucket index outside the bucket array.
    #[error("bucket {id} out of bounds for histogram with {bucket_count} buckets")]
    BucketOutOfBounds {
        /// Bucket requested.
        id: usize,
        /// Number of buckets.
        bucket_count: usize,
    },

    /// Parameter outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Flat input buffer has the wrong length for the given dimensions.
    #[error("buffer size {actual} doesn't match expected size {expected}")]
    InvalidBufferSize {
        /// Expected buffer length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlipError>;

/// Rejects slices holding NaN or infinite values.
pub(crate) fn check_finite_f32(values: &[f32], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        None => Ok(()),
        Some(index) => Err(FlipError::InvalidParameter(format!(
            "{what} contains a non-finite value at index {index}"
        ))),
    }
}
