//! # FLIP
//!
//! FLIP is a perceptual image difference metric: given a reference and a
//! test image, it predicts per pixel how visible the differences are to a
//! viewer when the two images are flipped back and forth.
//!
//! The metric is based on:
//! - Contrast sensitivity filtering in the YCxCz opponent color space,
//!   scaled by viewing distance (pixels per degree of visual angle)
//! - HyAB color distance in Hunt-adjusted CIELAB
//! - Edge and point feature detection on luminance
//!
//! Each error map value lies in [0, 1]: 0 is imperceptible, 1 is the
//! largest perceptible difference. A [`Pooling`] aggregates a map into the
//! mean and weighted quartiles usually reported.
//!
//! ## Example
//!
//! ```rust
//! use flip::{flip, ColorImage, FlipParams};
//! use rgb::RGB;
//!
//! let reference = ColorImage::filled(8, 8, RGB::new(0.2, 0.4, 0.6)).unwrap();
//! let mut test = reference.clone();
//! test.set(4, 4, RGB::new(1.0, 0.0, 0.0));
//!
//! let params = FlipParams::new().with_pixels_per_degree(30.0);
//! let result = flip(&reference, &test, &params).unwrap();
//!
//! assert!(result.error_map.get(4, 4) > 0.0);
//! assert!(result.summary.mean > 0.0);
//! ```
//!
//! ## Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for [`PoolSummary`]
//!
//! ## References
//!
//! - Andersson et al., "FLIP: A Difference Evaluator for Alternating Images",
//!   Proc. ACM Comput. Graph. Interact. Tech. 3(2), 2020
//! - <https://github.com/NVlabs/flip>

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

mod blur;
pub mod color;
mod colormap;
mod consts;
mod diff;
mod error;
mod filter;
mod histogram;
mod image;
mod pooling;

pub use crate::colormap::{builtin_ramp, color_map, BuiltinRamp, ColorRamp, BUILTIN_RAMP_LEN};
pub use crate::consts::{DEFAULT_HISTOGRAM_BUCKETS, DEFAULT_PIXELS_PER_DEGREE};
pub use crate::error::{FlipError, Result};
pub use crate::histogram::Histogram;
pub use crate::image::{ColorImage, PixelBuffer, ScalarImage};
pub use crate::pooling::{PoolSummary, Pooling};

// Re-export imgref types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{RGB, RGB8};

use std::f32::consts::PI;

/// Pixels per degree of visual angle for a viewer `distance` meters from a
/// monitor `monitor_width` meters wide showing `resolution_x` pixels across.
///
/// ```rust
/// // 0.7 m from a 0.7 m wide 4K monitor
/// let ppd = flip::pixels_per_degree(0.7, 3840.0, 0.7);
/// assert!((ppd - 67.0).abs() < 0.1);
/// ```
#[must_use]
pub fn pixels_per_degree(distance: f32, resolution_x: f32, monitor_width: f32) -> f32 {
    distance * (resolution_x / monitor_width) * (PI / 180.0)
}

/// FLIP comparison parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use flip::FlipParams;
///
/// let params = FlipParams::new()
///     .with_pixels_per_degree(42.0)  // closer viewer than the default
///     .with_histogram_buckets(256);  // finer pooled percentiles
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlipParams {
    pixels_per_degree: f32,
    histogram_buckets: usize,
}

impl Default for FlipParams {
    fn default() -> Self {
        Self {
            pixels_per_degree: DEFAULT_PIXELS_PER_DEGREE,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

impl FlipParams {
    /// Creates a new `FlipParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for a concrete viewing setup; see [`pixels_per_degree`].
    #[must_use]
    pub fn from_viewing_conditions(distance: f32, resolution_x: f32, monitor_width: f32) -> Self {
        Self::default().with_pixels_per_degree(pixels_per_degree(
            distance,
            resolution_x,
            monitor_width,
        ))
    }

    /// Sets the viewing distance in pixels per degree of visual angle.
    #[must_use]
    pub fn with_pixels_per_degree(mut self, pixels_per_degree: f32) -> Self {
        self.pixels_per_degree = pixels_per_degree;
        self
    }

    /// Sets the bucket count of the histogram behind the pooled summary.
    #[must_use]
    pub fn with_histogram_buckets(mut self, histogram_buckets: usize) -> Self {
        self.histogram_buckets = histogram_buckets;
        self
    }

    /// Returns the pixels per degree.
    #[must_use]
    pub fn pixels_per_degree(&self) -> f32 {
        self.pixels_per_degree
    }

    /// Returns the histogram bucket count.
    #[must_use]
    pub fn histogram_buckets(&self) -> usize {
        self.histogram_buckets
    }
}

/// Result of a full FLIP comparison.
#[derive(Debug, Clone)]
pub struct FlipResult {
    /// Per-pixel error in [0, 1].
    pub error_map: ScalarImage,
    /// Mean, weighted quartiles and extremes of the error map.
    pub summary: PoolSummary,
}

fn check_pixels_per_degree(pixels_per_degree: f32) -> Result<()> {
    if pixels_per_degree.is_finite() && pixels_per_degree > 0.0 {
        Ok(())
    } else {
        Err(FlipError::InvalidParameter(format!(
            "pixels per degree must be finite and positive, got {pixels_per_degree}"
        )))
    }
}

/// Computes the FLIP error map between two sRGB-encoded images.
///
/// Channel values are sRGB-encoded intensities in [0, 1]. Identical inputs
/// produce an all-zero map.
///
/// # Errors
/// - [`FlipError::DimensionMismatch`] if the images differ in size
/// - [`FlipError::InvalidParameter`] if `pixels_per_degree` is not finite
///   and positive, or an image holds a non-finite channel
pub fn compute_error_map(
    reference: &ColorImage,
    test: &ColorImage,
    pixels_per_degree: f32,
) -> Result<ScalarImage> {
    reference.check_same_size(test)?;
    check_pixels_per_degree(pixels_per_degree)?;
    reference.check_finite("reference image")?;
    test.check_finite("test image")?;

    Ok(diff::compute_error_map_impl(reference, test, pixels_per_degree))
}

/// Computes the error map and pools it into a [`PoolSummary`].
///
/// # Errors
/// Everything [`compute_error_map`] rejects, plus
/// [`FlipError::InvalidParameter`] for a zero histogram bucket count.
/// Identical images are accepted and yield an all-zero summary: every
/// bucket is weighted by its midpoint, which is positive even for the
/// bucket holding zero error.
pub fn flip(reference: &ColorImage, test: &ColorImage, params: &FlipParams) -> Result<FlipResult> {
    let mut pool = Pooling::new(params.histogram_buckets)?;
    let error_map = compute_error_map(reference, test, params.pixels_per_degree)?;
    pool.update_image(&error_map)?;

    Ok(FlipResult {
        summary: pool.summary()?,
        error_map,
    })
}

/// Compares two 8-bit sRGB images.
///
/// # Errors
/// Same as [`flip`], plus [`FlipError::InvalidDimensions`] for an empty
/// image.
pub fn flip_rgb8(
    reference: ImgRef<'_, RGB8>,
    test: ImgRef<'_, RGB8>,
    params: &FlipParams,
) -> Result<FlipResult> {
    let reference = ColorImage::from_imgref(reference)?;
    let test = ColorImage::from_imgref(test)?;
    flip(&reference, &test, params)
}
