//! Separable convolution for the FLIP filter bank.
//!
//! Every filter FLIP applies (contrast sensitivity Gaussians, feature
//! derivative-of-Gaussian kernels) is separable, so 2-D filtering is two 1-D
//! passes. Borders replicate the edge pixel (clamp-to-edge addressing);
//! kernels are used as given, without re-normalization at the border.
//!
//! Both passes split the output into rows handed to rayon as disjoint
//! chunks, and vectorize eight pixels at a time with `f32x8`. Accumulation
//! order over kernel taps is fixed, so results do not depend on the SIMD
//! width picked at runtime or on thread scheduling.

use crate::image::ScalarImage;
use rayon::prelude::*;
use wide::f32x8;

#[inline]
fn load8(s: &[f32]) -> f32x8 {
    let mut arr = [0.0f32; 8];
    arr.copy_from_slice(&s[..8]);
    f32x8::from(arr)
}

/// Copies `row` into `padded` with `radius` replicated edge pixels each side.
fn pad_replicate(row: &[f32], radius: usize, padded: &mut Vec<f32>) {
    padded.clear();
    let first = row[0];
    let last = row[row.len() - 1];
    padded.extend(std::iter::repeat(first).take(radius));
    padded.extend_from_slice(row);
    padded.extend(std::iter::repeat(last).take(radius));
}

/// Correlates a padded row with `kernel`; `out.len()` must equal
/// `padded.len() - kernel.len() + 1`.
#[multiversion::multiversion(targets(
    "x86_64+avx+avx2+fma",
    "x86_64+sse+sse2+sse3+sse4.1+ssse3",
))]
fn convolve_padded(padded: &[f32], kernel: &[f32], out: &mut [f32]) {
    let simd_chunks = out.len() / 8;

    for chunk in 0..simd_chunks {
        let x = chunk * 8;
        let mut sum = f32x8::splat(0.0);
        for (j, &k) in kernel.iter().enumerate() {
            sum += load8(&padded[x + j..]) * f32x8::splat(k);
        }
        let results: [f32; 8] = sum.into();
        out[x..x + 8].copy_from_slice(&results);
    }

    // Scalar tail
    for x in simd_chunks * 8..out.len() {
        let mut sum = 0.0f32;
        for (j, &k) in kernel.iter().enumerate() {
            sum += padded[x + j] * k;
        }
        out[x] = sum;
    }
}

/// `acc += src * k`, element-wise.
#[multiversion::multiversion(targets(
    "x86_64+avx+avx2+fma",
    "x86_64+sse+sse2+sse3+sse4.1+ssse3",
))]
fn accumulate_scaled(acc: &mut [f32], src: &[f32], k: f32) {
    let simd_chunks = acc.len() / 8;
    let kv = f32x8::splat(k);

    for chunk in 0..simd_chunks {
        let x = chunk * 8;
        let sum = load8(&acc[x..]) + load8(&src[x..]) * kv;
        let results: [f32; 8] = sum.into();
        acc[x..x + 8].copy_from_slice(&results);
    }

    for x in simd_chunks * 8..acc.len() {
        acc[x] += src[x] * k;
    }
}

/// Convolves every row with a centered, odd-length kernel.
#[must_use]
pub fn convolve_horizontal(input: &ScalarImage, kernel: &[f32]) -> ScalarImage {
    debug_assert!(kernel.len() % 2 == 1, "kernel length must be odd");
    let width = input.width();
    let radius = kernel.len() / 2;
    let mut output: ScalarImage = input.same_shape();

    output
        .data_mut()
        .par_chunks_mut(width)
        .zip(input.data().par_chunks(width))
        .for_each_init(
            || Vec::with_capacity(width + 2 * radius),
            |padded, (out_row, in_row)| {
                pad_replicate(in_row, radius, padded);
                convolve_padded(padded, kernel, out_row);
            },
        );

    output
}

/// Convolves every column with a centered, odd-length kernel.
#[must_use]
pub fn convolve_vertical(input: &ScalarImage, kernel: &[f32]) -> ScalarImage {
    debug_assert!(kernel.len() % 2 == 1, "kernel length must be odd");
    let width = input.width();
    let last_row = input.height() - 1;
    let radius = kernel.len() / 2;
    let mut output: ScalarImage = input.same_shape();

    output
        .data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            for (j, &k) in kernel.iter().enumerate() {
                let src_y = (y + j).saturating_sub(radius).min(last_row);
                accumulate_scaled(out_row, input.row(src_y), k);
            }
        });

    output
}

/// Applies `horizontal` along rows, then `vertical` along columns.
#[must_use]
pub fn convolve_separable(input: &ScalarImage, horizontal: &[f32], vertical: &[f32]) -> ScalarImage {
    convolve_vertical(&convolve_horizontal(input, horizontal), vertical)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct 2-D evaluation with clamped coordinates.
    fn naive_separable(input: &ScalarImage, kx: &[f32], ky: &[f32]) -> ScalarImage {
        let (w, h) = (input.width() as isize, input.height() as isize);
        let (rx, ry) = (kx.len() as isize / 2, ky.len() as isize / 2);
        let mut out = input.clone();
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0.0f32;
                for (j, &wy) in ky.iter().enumerate() {
                    let sy = (y + j as isize - ry).clamp(0, h - 1) as usize;
                    for (i, &wx) in kx.iter().enumerate() {
                        let sx = (x + i as isize - rx).clamp(0, w - 1) as usize;
                        sum += input.get(sx, sy) * wx * wy;
                    }
                }
                out.set(x as usize, y as usize, sum);
            }
        }
        out
    }

    fn ramp_image(width: usize, height: usize) -> ScalarImage {
        let data = (0..width * height)
            .map(|i| ((i * 37) % 101) as f32 / 100.0)
            .collect();
        ScalarImage::from_vec(data, width, height).unwrap()
    }

    #[test]
    fn test_constant_image_unchanged() {
        let img = ScalarImage::filled(21, 9, 0.5).unwrap();
        let kernel = [0.25, 0.5, 0.25];
        let out = convolve_separable(&img, &kernel, &kernel);
        for &v in out.data() {
            assert!((v - 0.5).abs() < 1e-6, "got {v}");
        }
    }

    #[test]
    fn test_matches_naive_with_odd_width() {
        let img = ramp_image(13, 7);
        let kx = [0.1, 0.2, 0.4, 0.2, 0.1];
        let ky = [-1.0, 0.0, 1.0];
        let fast = convolve_separable(&img, &kx, &ky);
        let slow = naive_separable(&img, &kx, &ky);
        for (a, b) in fast.data().iter().zip(slow.data()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn test_kernel_wider_than_image() {
        let img = ramp_image(3, 2);
        let kernel = [0.05, 0.1, 0.15, 0.4, 0.15, 0.1, 0.05];
        let fast = convolve_separable(&img, &kernel, &kernel);
        let slow = naive_separable(&img, &kernel, &kernel);
        for (a, b) in fast.data().iter().zip(slow.data()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn test_impulse_spreads() {
        let mut img = ScalarImage::new(32, 32).unwrap();
        img.set(16, 16, 1.0);
        let kernel = [0.25, 0.5, 0.25];
        let out = convolve_separable(&img, &kernel, &kernel);
        assert!((out.get(16, 16) - 0.25).abs() < 1e-6);
        assert!(out.get(15, 16) > 0.0);
        assert!(out.get(16, 17) > 0.0);
        assert_eq!(out.get(0, 0), 0.0);
    }

    #[test]
    fn test_border_replicates_edge() {
        // A one-sided kernel that reads the pixel to the left
        let data = vec![2.0, 3.0, 4.0];
        let img = ScalarImage::from_vec(data, 3, 1).unwrap();
        let out = convolve_horizontal(&img, &[1.0, 0.0, 0.0]);
        assert_eq!(out.data(), &[2.0, 2.0, 3.0]);
    }
}
