//! Streaming aggregation of error values into scalar quality figures.
//!
//! A [`Pooling`] owns one [`Histogram`] plus running min, max, sum and
//! count. Percentiles are read off the histogram on demand, so they are
//! quantized to bucket resolution.
//!
//! ## Percentile conventions
//!
//! - A bucket is represented by its midpoint, clamped into the observed
//!   `[min, max]`, so `percentile(0, _)` never reports less than the
//!   smallest value seen and `percentile(1, _)` never more than the largest.
//! - The walk visits buckets in ascending order and stops at the first
//!   non-empty bucket whose cumulative total reaches `p * total`.
//! - Unweighted: the total is the observation count ("which value sits at
//!   rank p").
//! - Weighted: each bucket contributes `count * midpoint` ("which value
//!   captures fraction p of the summed error"). This assumes non-negative
//!   values; a pool whose total weight is not positive cannot answer.
//!
//! ## Empty pools
//!
//! `min`, `max`, `mean` and unweighted percentiles of an empty pool return
//! NaN. Weighted percentiles of an empty pool fail with
//! [`FlipError::InvalidParameter`].

use crate::error::{check_finite_f32, FlipError, Result};
use crate::histogram::Histogram;
use crate::image::ScalarImage;
use rayon::prelude::*;
use tracing::trace;

/// Rows per shard when pooling a whole image in parallel.
const ROWS_PER_SHARD: usize = 32;

/// Streaming min/max/mean/percentile aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Pooling {
    histogram: Histogram,
    min_value: f32,
    max_value: f32,
    sum: f64,
    count: usize,
}

impl Pooling {
    /// Creates a pool whose histogram spans [0, 1], the error map range.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Result<Self> {
        Self::with_range(bucket_count, 0.0, 1.0)
    }

    /// Creates a pool with an explicit histogram range.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] for a zero bucket count or an
    /// empty, inverted or non-finite range.
    pub fn with_range(bucket_count: usize, min_value: f32, max_value: f32) -> Result<Self> {
        Ok(Self::empty(Histogram::new(bucket_count, min_value, max_value)?))
    }

    fn empty(histogram: Histogram) -> Self {
        Self {
            histogram,
            min_value: f32::INFINITY,
            max_value: f32::NEG_INFINITY,
            sum: 0.0,
            count: 0,
        }
    }

    /// Records one observation.
    ///
    /// The pixel coordinates are accepted for API symmetry with per-pixel
    /// producers but do not affect any statistic.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] for NaN or infinite values;
    /// the pool is unchanged in that case.
    pub fn update(&mut self, _x: usize, _y: usize, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(FlipError::InvalidParameter(format!(
                "cannot pool non-finite value {value}"
            )));
        }
        self.accumulate(value);
        Ok(())
    }

    /// Records every pixel of `image`.
    ///
    /// Rows are split into shards, each accumulated into a private partial
    /// pool on a rayon worker; partials are merged in shard order, so the
    /// result does not depend on scheduling.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if any pixel is non-finite;
    /// the pool is unchanged in that case.
    pub fn update_image(&mut self, image: &ScalarImage) -> Result<()> {
        check_finite_f32(image.data(), "pooling input")?;

        let shard_len = image.width() * ROWS_PER_SHARD;
        let template = {
            let mut h = self.histogram.clone();
            h.clear();
            h
        };

        let partials: Vec<Pooling> = image
            .data()
            .par_chunks(shard_len)
            .map(|shard| {
                let mut partial = Self::empty(template.clone());
                for &value in shard {
                    partial.accumulate(value);
                }
                partial
            })
            .collect();

        trace!(shards = partials.len(), pixels = image.len(), "pooled image");

        for partial in &partials {
            self.merge(partial)?;
        }
        Ok(())
    }

    /// Adds a value already known to be finite.
    fn accumulate(&mut self, value: f32) {
        self.histogram.add(value, 1);
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
        self.sum += f64::from(value);
        self.count += 1;
    }

    /// Folds another pool's observations into this one.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if the histograms differ in
    /// geometry.
    pub fn merge(&mut self, other: &Pooling) -> Result<()> {
        self.histogram.merge(&other.histogram)?;
        self.min_value = self.min_value.min(other.min_value);
        self.max_value = self.max_value.max(other.max_value);
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }

    /// Discards every observation, keeping the histogram geometry.
    pub fn clear(&mut self) {
        self.histogram.clear();
        self.min_value = f32::INFINITY;
        self.max_value = f32::NEG_INFINITY;
        self.sum = 0.0;
        self.count = 0;
    }

    /// Backing histogram.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Number of observations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Smallest observed value, NaN if empty.
    #[must_use]
    pub fn min(&self) -> f32 {
        if self.count == 0 {
            f32::NAN
        } else {
            self.min_value
        }
    }

    /// Largest observed value, NaN if empty.
    #[must_use]
    pub fn max(&self) -> f32 {
        if self.count == 0 {
            f32::NAN
        } else {
            self.max_value
        }
    }

    /// Arithmetic mean of all observations, NaN if empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            f32::NAN
        } else {
            (self.sum / self.count as f64) as f32
        }
    }

    /// Percentile `p` in [0, 1], unweighted or value-weighted.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `p` is outside [0, 1], or
    /// if `weighted` is set and the total weight is not positive.
    pub fn percentile(&self, p: f32, weighted: bool) -> Result<f32> {
        if weighted {
            return self.weighted_percentile(f64::from(p)).map(|v| v as f32);
        }
        check_fraction(f64::from(p))?;
        if self.count == 0 {
            return Ok(f32::NAN);
        }

        let buckets = self.histogram.buckets();
        let target = f64::from(p) * self.histogram.total() as f64;
        let id = walk(buckets.iter().map(|&c| c as f64), target);
        Ok(self.representative(id))
    }

    /// Value-weighted percentile in double precision.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `p` is outside [0, 1] or
    /// the total weight is not positive (including an empty pool).
    pub fn weighted_percentile(&self, p: f64) -> Result<f64> {
        check_fraction(p)?;

        let weights: Vec<f64> = self
            .histogram
            .buckets()
            .iter()
            .enumerate()
            .map(|(id, &c)| c as f64 * f64::from(self.histogram.bucket_midpoint(id)))
            .collect();
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) {
            return Err(FlipError::InvalidParameter(format!(
                "weighted percentile needs positive total weight, got {total}"
            )));
        }

        let id = walk(weights.iter().copied(), p * total);
        Ok(f64::from(self.representative(id)))
    }

    fn representative(&self, id: usize) -> f32 {
        self.histogram
            .bucket_midpoint(id)
            .clamp(self.min_value, self.max_value)
    }

    /// Summary figures for reporting.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] when weighted quartiles are
    /// undefined (empty pool or non-positive total weight).
    pub fn summary(&self) -> Result<PoolSummary> {
        Ok(PoolSummary {
            mean: self.mean(),
            weighted_median: self.weighted_percentile(0.5)? as f32,
            first_weighted_quartile: self.weighted_percentile(0.25)? as f32,
            third_weighted_quartile: self.weighted_percentile(0.75)? as f32,
            min: self.min(),
            max: self.max(),
        })
    }
}

fn check_fraction(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(FlipError::InvalidParameter(format!(
            "percentile {p} outside [0, 1]"
        )));
    }
    Ok(())
}

/// First bucket with positive weight whose cumulative weight reaches
/// `target`. Falls back to the last positive bucket to absorb rounding.
fn walk(weights: impl Iterator<Item = f64>, target: f64) -> usize {
    let mut cumulative = 0.0f64;
    let mut last_positive = 0;
    for (id, w) in weights.enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = id;
        if cumulative >= target {
            return id;
        }
    }
    last_positive
}

/// Scalar figures summarizing an error map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSummary {
    /// Mean error.
    pub mean: f32,
    /// Weighted 50th percentile.
    pub weighted_median: f32,
    /// Weighted 25th percentile.
    pub first_weighted_quartile: f32,
    /// Weighted 75th percentile.
    pub third_weighted_quartile: f32,
    /// Smallest error.
    pub min: f32,
    /// Largest error.
    pub max: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(values: &[f32]) -> Pooling {
        let mut pool = Pooling::new(100).unwrap();
        for (i, &v) in values.iter().enumerate() {
            pool.update(i, 0, v).unwrap();
        }
        pool
    }

    #[test]
    fn test_mean_min_max() {
        let pool = pool_of(&[0.1, 0.2, 0.3]);
        assert!((pool.mean() - 0.2).abs() < 1e-6);
        assert!((pool.min() - 0.1).abs() < 1e-7);
        assert!((pool.max() - 0.3).abs() < 1e-7);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn test_empty_sentinels() {
        let pool = Pooling::new(10).unwrap();
        assert!(pool.mean().is_nan());
        assert!(pool.min().is_nan());
        assert!(pool.max().is_nan());
        assert!(pool.percentile(0.5, false).unwrap().is_nan());
        assert!(pool.percentile(0.5, true).is_err());
        assert!(pool.summary().is_err());
    }

    #[test]
    fn test_all_zero_pool_has_weight() {
        // Bucket 0 is weighted by its midpoint, so zeros still count
        let mut pool = Pooling::new(100).unwrap();
        pool.update_image(&ScalarImage::new(4, 4).unwrap()).unwrap();
        assert_eq!(pool.weighted_percentile(0.5).unwrap(), 0.0);
        assert_eq!(pool.percentile(0.75, true).unwrap(), 0.0);
        let s = pool.summary().unwrap();
        assert_eq!(s.weighted_median, 0.0);
        assert_eq!(s.max, 0.0);
    }

    #[test]
    fn test_percentile_domain() {
        let pool = pool_of(&[0.5]);
        assert!(pool.percentile(-0.01, false).is_err());
        assert!(pool.percentile(1.01, true).is_err());
        assert!(pool.percentile(f32::NAN, false).is_err());
    }

    #[test]
    fn test_unweighted_percentiles() {
        // 90 values at 0.045 and 10 at 0.955, both bucket midpoints
        let mut values = vec![0.045; 90];
        values.extend(std::iter::repeat(0.955).take(10));
        let pool = pool_of(&values);
        assert!((pool.percentile(0.5, false).unwrap() - 0.045).abs() < 1e-6);
        assert!((pool.percentile(0.9, false).unwrap() - 0.045).abs() < 1e-6);
        assert!((pool.percentile(0.95, false).unwrap() - 0.955).abs() < 1e-6);
        assert!((pool.percentile(0.0, false).unwrap() - 0.045).abs() < 1e-6);
        assert!((pool.percentile(1.0, false).unwrap() - 0.955).abs() < 1e-6);
    }

    #[test]
    fn test_percentile_reports_clamped_midpoint() {
        // 0.05 lands in bucket 5, whose midpoint 0.055 lies inside [min, max]
        let mut values = vec![0.05; 90];
        values.extend(std::iter::repeat(0.95).take(10));
        let pool = pool_of(&values);
        let p0 = pool.percentile(0.0, false).unwrap();
        assert!(p0 >= pool.min() && p0 < 0.06, "p0 = {p0}");
        let p1 = pool.percentile(1.0, false).unwrap();
        assert!(p1 <= pool.max() && p1 > 0.94, "p1 = {p1}");
    }

    #[test]
    fn test_weighted_differs_from_unweighted() {
        // Rank 0.5 sits among the small values, but the large values carry
        // most of the magnitude: 90 * 0.05 = 4.5 vs 10 * 0.95 = 9.5.
        let mut values = vec![0.05; 90];
        values.extend(std::iter::repeat(0.95).take(10));
        let pool = pool_of(&values);
        let unweighted = pool.percentile(0.5, false).unwrap();
        let weighted = pool.percentile(0.5, true).unwrap();
        assert!(unweighted < 0.1);
        assert!(weighted > 0.9);
        assert!((pool.weighted_percentile(0.5).unwrap() - f64::from(weighted)).abs() < 1e-6);
    }

    #[test]
    fn test_representative_clamped_to_observed_range() {
        let pool = pool_of(&[0.501]);
        // Midpoint of bucket 50 is 0.505 but nothing above 0.501 was seen
        assert!((pool.percentile(1.0, false).unwrap() - 0.501).abs() < 1e-6);
    }

    #[test]
    fn test_update_rejects_non_finite() {
        let mut pool = pool_of(&[0.2]);
        assert!(pool.update(0, 0, f32::NAN).is_err());
        assert_eq!(pool.count(), 1);
        assert!((pool.mean() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_update_image_matches_per_pixel() {
        let (w, h) = (7, 70);
        let data: Vec<f32> = (0..w * h).map(|i| ((i * 13) % 97) as f32 / 96.0).collect();
        let image = ScalarImage::from_vec(data.clone(), w, h).unwrap();

        let mut bulk = Pooling::new(64).unwrap();
        bulk.update_image(&image).unwrap();

        let mut single = Pooling::new(64).unwrap();
        for (i, &v) in data.iter().enumerate() {
            single.update(i % w, i / w, v).unwrap();
        }

        assert_eq!(bulk.histogram(), single.histogram());
        assert_eq!(bulk.count(), single.count());
        assert_eq!(bulk.min(), single.min());
        assert_eq!(bulk.max(), single.max());
        assert!((bulk.mean() - single.mean()).abs() < 1e-6);
    }

    #[test]
    fn test_clear() {
        let mut pool = pool_of(&[0.3, 0.4]);
        pool.clear();
        assert_eq!(pool.count(), 0);
        assert!(pool.mean().is_nan());
        assert_eq!(pool.histogram().bucket_count(), 100);
    }

    #[test]
    fn test_summary_ordering() {
        let values: Vec<f32> = (0..200).map(|i| i as f32 / 199.0).collect();
        let s = pool_of(&values).summary().unwrap();
        assert!(s.min <= s.first_weighted_quartile);
        assert!(s.first_weighted_quartile <= s.weighted_median);
        assert!(s.weighted_median <= s.third_weighted_quartile);
        assert!(s.third_weighted_quartile <= s.max);
        assert!((s.mean - 0.5).abs() < 1e-5);
    }
}
