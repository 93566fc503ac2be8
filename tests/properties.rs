//! Property-based tests for the FLIP metric and its aggregation.
//!
//! Images are kept small so each case stays cheap; the properties are
//! size-independent.

use flip::{
    color_map, compute_error_map, ColorImage, ColorRamp, Histogram, Pooling, ScalarImage, RGB,
};
use proptest::prelude::*;

/// Small RGB byte image with its dimensions.
fn rgb_image() -> impl Strategy<Value = (usize, usize, Vec<u8>)> {
    (1usize..12, 1usize..12).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            proptest::collection::vec(any::<u8>(), w * h * 3),
        )
    })
}

/// Two RGB byte images of the same size.
fn rgb_pair() -> impl Strategy<Value = (usize, usize, Vec<u8>, Vec<u8>)> {
    (1usize..10, 1usize..10).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            proptest::collection::vec(any::<u8>(), w * h * 3),
            proptest::collection::vec(any::<u8>(), w * h * 3),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Comparing an image with itself gives exactly zero everywhere.
    #[test]
    fn prop_identity_is_zero((w, h, rgb) in rgb_image(), ppd in 1.0f32..120.0) {
        let img = ColorImage::from_rgb8(w, h, Some(&rgb)).unwrap();
        let map = compute_error_map(&img, &img, ppd).unwrap();
        prop_assert!(map.data().iter().all(|&v| v == 0.0));
    }

    /// Every error value lies in [0, 1].
    #[test]
    fn prop_error_in_unit_range((w, h, a, b) in rgb_pair(), ppd in 1.0f32..120.0) {
        let reference = ColorImage::from_rgb8(w, h, Some(&a)).unwrap();
        let test = ColorImage::from_rgb8(w, h, Some(&b)).unwrap();
        let map = compute_error_map(&reference, &test, ppd).unwrap();
        prop_assert_eq!((map.width(), map.height()), (w, h));
        for &v in map.data() {
            prop_assert!((0.0..=1.0).contains(&v), "error {} out of range", v);
        }
    }

    /// Decoding bytes and encoding them again is lossless.
    #[test]
    fn prop_byte_round_trip((w, h, rgb) in rgb_image()) {
        let img = ColorImage::from_rgb8(w, h, Some(&rgb)).unwrap();
        prop_assert_eq!(img.to_rgb8(), rgb);
    }

    /// A histogram counts every finite value exactly once, wherever it lands.
    #[test]
    fn prop_histogram_conserves_counts(
        values in proptest::collection::vec(-2.0f32..3.0, 0..200),
        buckets in 1usize..64,
    ) {
        let mut h = Histogram::new(buckets, 0.0, 1.0).unwrap();
        for &v in &values {
            h.increment(v, 1).unwrap();
        }
        prop_assert_eq!(h.total(), values.len());
        for &v in &values {
            prop_assert!(h.bucket_id(v) < buckets);
        }
    }

    /// Percentiles never decrease as p grows, weighted or not.
    #[test]
    fn prop_percentiles_monotone(
        values in proptest::collection::vec(0.001f32..1.0, 1..300),
        buckets in 1usize..128,
    ) {
        let mut pool = Pooling::new(buckets).unwrap();
        for (i, &v) in values.iter().enumerate() {
            pool.update(i, 0, v).unwrap();
        }
        for weighted in [false, true] {
            let mut previous = f32::NEG_INFINITY;
            for i in 0..=20 {
                let p = pool.percentile(i as f32 / 20.0, weighted).unwrap();
                prop_assert!(p >= previous);
                prop_assert!(p >= pool.min() && p <= pool.max());
                previous = p;
            }
        }
    }

    /// Pooling a whole image matches pooling it pixel by pixel.
    #[test]
    fn prop_update_image_matches_update(
        (w, h) in (1usize..20, 1usize..80),
        seed in any::<u64>(),
    ) {
        let data: Vec<f32> = (0..w * h)
            .map(|i| ((seed.wrapping_add(i as u64).wrapping_mul(2654435761) >> 7) % 1000) as f32 / 999.0)
            .collect();
        let image = ScalarImage::from_vec(data.clone(), w, h).unwrap();

        let mut bulk = Pooling::new(50).unwrap();
        bulk.update_image(&image).unwrap();
        let mut single = Pooling::new(50).unwrap();
        for (i, &v) in data.iter().enumerate() {
            single.update(i % w, i / w, v).unwrap();
        }
        prop_assert_eq!(bulk.histogram(), single.histogram());
        prop_assert_eq!(bulk.min(), single.min());
        prop_assert_eq!(bulk.max(), single.max());
    }

    /// Color mapping picks the ramp entry nearest to e * (len - 1).
    #[test]
    fn prop_color_map_index(e in -0.5f32..1.5, len in 1usize..40) {
        let colors = (0..len)
            .map(|i| RGB::new(i as f32, 0.0, 0.0))
            .collect();
        let ramp = ColorRamp::from_colors(colors).unwrap();
        let map = ScalarImage::filled(1, 1, e).unwrap();
        let picked = color_map(&map, &ramp).get(0, 0).r;
        let expected = (e.clamp(0.0, 1.0) * (len - 1) as f32).round();
        prop_assert_eq!(picked, expected);
    }
}
