//! Fixed-bucket histogram over a scalar value range.
//!
//! Values outside `[min_value, max_value)` are clamped into the first or
//! last bucket rather than discarded, so every accepted observation is
//! counted. A value exactly at `max_value` lands in the last bucket.

use crate::error::{check_finite_f32, FlipError, Result};
use crate::image::ScalarImage;

/// Frequency distribution with `bucket_count` equal-width buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    buckets: Vec<usize>,
    min_value: f32,
    max_value: f32,
    bucket_step: f32,
}

impl Histogram {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `bucket_count` is zero or
    /// the range is empty, inverted or not finite.
    pub fn new(bucket_count: usize, min_value: f32, max_value: f32) -> Result<Self> {
        if bucket_count == 0 {
            return Err(FlipError::InvalidParameter(
                "histogram needs at least one bucket".into(),
            ));
        }
        if !(min_value.is_finite() && max_value.is_finite()) || min_value >= max_value {
            return Err(FlipError::InvalidParameter(format!(
                "histogram range [{min_value}, {max_value}) is empty or not finite"
            )));
        }
        Ok(Self {
            buckets: vec![0; bucket_count],
            min_value,
            max_value,
            bucket_step: (max_value - min_value) / bucket_count as f32,
        })
    }

    /// Number of buckets.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lower end of the value range.
    #[inline]
    #[must_use]
    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Upper end of the value range.
    #[inline]
    #[must_use]
    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    /// Width of one bucket.
    #[inline]
    #[must_use]
    pub fn bucket_step(&self) -> f32 {
        self.bucket_step
    }

    /// Bucket counts in ascending value order.
    #[inline]
    #[must_use]
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    /// Bucket that `value` falls in, clamped to the valid bucket range.
    ///
    /// NaN maps to bucket 0; [`increment`](Self::increment) rejects it before
    /// it gets here.
    #[must_use]
    pub fn bucket_id(&self, value: f32) -> usize {
        let position = ((value - self.min_value) / self.bucket_step).floor();
        // Saturating float-to-int cast: negatives and NaN become 0.
        (position as usize).min(self.buckets.len() - 1)
    }

    /// Count stored in bucket `id`.
    ///
    /// # Errors
    /// Returns [`FlipError::BucketOutOfBounds`] for `id >= bucket_count`.
    pub fn bucket_value(&self, id: usize) -> Result<usize> {
        self.buckets
            .get(id)
            .copied()
            .ok_or(FlipError::BucketOutOfBounds {
                id,
                bucket_count: self.buckets.len(),
            })
    }

    /// Lower edge of bucket `id`.
    #[must_use]
    pub fn bucket_lower_edge(&self, id: usize) -> f32 {
        self.min_value + id as f32 * self.bucket_step
    }

    /// Midpoint of bucket `id`, the value a bucket stands for in percentiles.
    #[must_use]
    pub fn bucket_midpoint(&self, id: usize) -> f32 {
        self.min_value + (id as f32 + 0.5) * self.bucket_step
    }

    /// Total number of observations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// Lowest non-empty bucket, `None` when the histogram is empty.
    #[must_use]
    pub fn bucket_id_min(&self) -> Option<usize> {
        self.buckets.iter().position(|&c| c > 0)
    }

    /// Highest non-empty bucket, `None` when the histogram is empty.
    #[must_use]
    pub fn bucket_id_max(&self) -> Option<usize> {
        self.buckets.iter().rposition(|&c| c > 0)
    }

    /// Adds `count` observations of `value`.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] for NaN or infinite values.
    pub fn increment(&mut self, value: f32, count: usize) -> Result<()> {
        if !value.is_finite() {
            return Err(FlipError::InvalidParameter(format!(
                "cannot histogram non-finite value {value}"
            )));
        }
        self.add(value, count);
        Ok(())
    }

    /// Adds `count` observations of a value already known to be finite.
    #[inline]
    pub(crate) fn add(&mut self, value: f32, count: usize) {
        let id = self.bucket_id(value);
        self.buckets[id] += count;
    }

    /// Adds one observation per pixel of `image`.
    ///
    /// The image is validated first, so a failed call leaves the histogram
    /// untouched.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if any pixel is non-finite.
    pub fn increment_image(&mut self, image: &ScalarImage) -> Result<()> {
        check_finite_f32(image.data(), "histogram input")?;
        for &value in image.data() {
            self.add(value, 1);
        }
        Ok(())
    }

    /// Replaces the bucket array with `bucket_count` empty buckets over the
    /// same value range.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `bucket_count` is zero.
    pub fn resize(&mut self, bucket_count: usize) -> Result<()> {
        *self = Self::new(bucket_count, self.min_value, self.max_value)?;
        Ok(())
    }

    /// Zeroes every bucket, keeping the geometry.
    pub fn clear(&mut self) {
        self.buckets.fill(0);
    }

    /// Adds another histogram's counts bucket by bucket.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if bucket count or range differ.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.buckets.len() != other.buckets.len()
            || self.min_value != other.min_value
            || self.max_value != other.max_value
        {
            return Err(FlipError::InvalidParameter(format!(
                "cannot merge histogram of {} buckets over [{}, {}) into {} buckets over [{}, {})",
                other.buckets.len(),
                other.min_value,
                other.max_value,
                self.buckets.len(),
                self.min_value,
                self.max_value
            )));
        }
        for (a, b) in self.buckets.iter_mut().zip(&other.buckets) {
            *a += b;
        }
        Ok(())
    }
}
