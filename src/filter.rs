//! Spatial filter bank modeling human contrast sensitivity and feature
//! detection.
//!
//! Two independent sets of separable kernels are built for a given viewing
//! distance (pixels per degree of visual angle):
//! - Contrast sensitivity (CSF) kernels, one per YCxCz channel, which blur
//!   away spatial frequencies the eye cannot resolve at that distance
//! - Feature kernels (first and second derivatives of a Gaussian) which
//!   detect edges and points in the luminance channel
//!
//! The bank turns a color image into a [`FilterResponse`]: Hunt-adjusted
//! CIELAB of the CSF-filtered image plus edge and point magnitudes.

use crate::blur::{convolve_horizontal, convolve_separable, convolve_vertical};
use crate::color::{
    linear_rgb_to_hunt_lab, reference_white, srgb_to_ycxcz, ycxcz_luminance, ycxcz_to_xyz,
    xyz_to_linear_rgb,
};
use crate::consts::{
    CsfTerm, CSF_ACHROMATIC, CSF_BLUE_YELLOW, CSF_RED_GREEN, FEATURE_GAUSSIAN_WIDTH,
    KERNEL_SUPPORT_SIGMAS,
};
use crate::image::{ColorImage, ScalarImage};
use rayon::prelude::*;
use std::f32::consts::PI;

/// One separable Gaussian term of a CSF kernel.
#[derive(Debug, Clone)]
struct CsfComponent {
    /// Share of the channel's total 2-D kernel mass.
    weight: f32,
    /// Normalized 1-D taps, used along both axes.
    taps: Vec<f32>,
}

/// Contrast sensitivity kernel for one channel, a weighted sum of
/// separable Gaussians.
#[derive(Debug, Clone)]
struct CsfKernel {
    components: Vec<CsfComponent>,
}

impl CsfKernel {
    fn new(terms: &[CsfTerm], pixels_per_degree: f32) -> Self {
        // Each term is a * sqrt(pi / b) * g(x) * g(y) with
        // g(x) = exp(-pi^2 * (x / ppd)^2 / b).
        let raw: Vec<(f32, Vec<f32>)> = terms
            .iter()
            .map(|term| {
                let sigma_degrees = (term.b / (2.0 * PI * PI)).sqrt();
                let radius = support_radius(sigma_degrees * pixels_per_degree);
                let taps: Vec<f32> = (-radius..=radius)
                    .map(|i| {
                        let d = i as f32 / pixels_per_degree;
                        (-PI * PI * d * d / term.b).exp()
                    })
                    .collect();
                let sum: f32 = taps.iter().sum();
                let mass = term.a * (PI / term.b).sqrt() * sum * sum;
                let taps = taps.into_iter().map(|t| t / sum).collect();
                (mass, taps)
            })
            .collect();

        let total_mass: f32 = raw.iter().map(|(mass, _)| mass).sum();
        let components = raw
            .into_iter()
            .map(|(mass, taps)| CsfComponent {
                weight: mass / total_mass,
                taps,
            })
            .collect();

        Self { components }
    }

    fn radius(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.taps.len() / 2)
            .max()
            .unwrap_or(0)
    }

    fn apply(&self, plane: &ScalarImage) -> ScalarImage {
        let mut filtered: Option<ScalarImage> = None;
        for component in &self.components {
            let mut blurred = convolve_separable(plane, &component.taps, &component.taps);
            if self.components.len() > 1 {
                blurred.data_mut().iter_mut().for_each(|v| *v *= component.weight);
            }
            filtered = Some(match filtered {
                None => blurred,
                Some(mut acc) => {
                    for (a, b) in acc.data_mut().iter_mut().zip(blurred.data()) {
                        *a += b;
                    }
                    acc
                }
            });
        }
        filtered.unwrap_or_else(|| plane.clone())
    }
}

/// Number of taps either side of the center covering `sigma_pixels`.
fn support_radius(sigma_pixels: f32) -> i32 {
    ((KERNEL_SUPPORT_SIGMAS * sigma_pixels).ceil() as i32).max(1)
}

/// 1-D Gaussian and its first two derivatives used for feature detection.
#[derive(Debug, Clone)]
struct FeatureKernels {
    /// Gaussian, normalized to sum 1.
    gaussian: Vec<f32>,
    /// First derivative; positive and negative lobes each sum to +-1.
    edge: Vec<f32>,
    /// Second derivative; positive and negative lobes each sum to +-1.
    point: Vec<f32>,
}

impl FeatureKernels {
    fn new(pixels_per_degree: f32) -> Self {
        let sigma = 0.5 * FEATURE_GAUSSIAN_WIDTH * pixels_per_degree;
        let radius = support_radius(sigma);

        let mut gaussian = Vec::with_capacity((2 * radius + 1) as usize);
        let mut edge = Vec::with_capacity(gaussian.capacity());
        let mut point = Vec::with_capacity(gaussian.capacity());
        for i in -radius..=radius {
            let x = i as f32;
            let g = (-(x * x) / (2.0 * sigma * sigma)).exp();
            gaussian.push(g);
            edge.push(-x * g);
            point.push((x * x / (sigma * sigma) - 1.0) * g);
        }

        let g_sum: f32 = gaussian.iter().sum();
        gaussian.iter_mut().for_each(|g| *g /= g_sum);
        normalize_lobes(&mut edge);
        normalize_lobes(&mut point);

        Self {
            gaussian,
            edge,
            point,
        }
    }

    fn radius(&self) -> usize {
        self.gaussian.len() / 2
    }
}

/// Scales positive taps to sum to 1 and negative taps to sum to -1.
fn normalize_lobes(taps: &mut [f32]) {
    let positive: f32 = taps.iter().filter(|&&t| t > 0.0).sum();
    let negative: f32 = -taps.iter().filter(|&&t| t < 0.0).sum::<f32>();
    for t in taps.iter_mut() {
        if *t > 0.0 && positive > 0.0 {
            *t /= positive;
        } else if *t < 0.0 && negative > 0.0 {
            *t /= negative;
        }
    }
}

/// Filtered planes of one image, consumed by the difference metric.
#[derive(Debug, Clone)]
pub(crate) struct FilterResponse {
    /// Hunt-adjusted CIELAB (L, a, b) of the CSF-filtered image.
    pub lab: [ScalarImage; 3],
    /// Edge magnitude of the luminance.
    pub edges: ScalarImage,
    /// Point magnitude of the luminance.
    pub points: ScalarImage,
}

/// Filter kernels for one viewing distance.
#[derive(Debug, Clone)]
pub(crate) struct FilterBank {
    csf: [CsfKernel; 3],
    features: FeatureKernels,
    white: [f32; 3],
}

impl FilterBank {
    /// Builds every kernel for `pixels_per_degree` (finite and positive).
    pub fn new(pixels_per_degree: f32) -> Self {
        Self {
            csf: [
                CsfKernel::new(CSF_ACHROMATIC, pixels_per_degree),
                CsfKernel::new(CSF_RED_GREEN, pixels_per_degree),
                CsfKernel::new(CSF_BLUE_YELLOW, pixels_per_degree),
            ],
            features: FeatureKernels::new(pixels_per_degree),
            white: reference_white(),
        }
    }

    /// Largest CSF kernel radius, in pixels.
    pub fn csf_radius(&self) -> usize {
        self.csf.iter().map(CsfKernel::radius).max().unwrap_or(0)
    }

    /// Feature kernel radius, in pixels.
    pub fn feature_radius(&self) -> usize {
        self.features.radius()
    }

    /// Runs the whole bank over one sRGB-encoded image.
    pub fn respond(&self, image: &ColorImage) -> FilterResponse {
        let [y, cx, cz] = self.to_ycxcz_planes(image);

        let mut luminance = y.clone();
        luminance
            .data_mut()
            .par_iter_mut()
            .for_each(|v| *v = ycxcz_luminance(*v));

        let filtered = [
            self.csf[0].apply(&y),
            self.csf[1].apply(&cx),
            self.csf[2].apply(&cz),
        ];
        let lab = self.to_hunt_lab(filtered);
        let (edges, points) = self.detect_features(&luminance);

        FilterResponse { lab, edges, points }
    }

    fn to_ycxcz_planes(&self, image: &ColorImage) -> [ScalarImage; 3] {
        let width = image.width();
        let mut planes: [ScalarImage; 3] = [image.same_shape(), image.same_shape(), image.same_shape()];
        let [p0, p1, p2] = &mut planes;

        p0.data_mut()
            .par_chunks_mut(width)
            .zip(p1.data_mut().par_chunks_mut(width))
            .zip(p2.data_mut().par_chunks_mut(width))
            .zip(image.data().par_chunks(width))
            .for_each(|(((r0, r1), r2), src)| {
                for x in 0..width {
                    let px = src[x];
                    let v = srgb_to_ycxcz([px.r, px.g, px.b], self.white);
                    r0[x] = v[0];
                    r1[x] = v[1];
                    r2[x] = v[2];
                }
            });

        planes
    }

    /// Converts filtered YCxCz planes to Hunt-adjusted CIELAB in place.
    fn to_hunt_lab(&self, mut planes: [ScalarImage; 3]) -> [ScalarImage; 3] {
        let width = planes[0].width();
        let [p0, p1, p2] = &mut planes;

        p0.data_mut()
            .par_chunks_mut(width)
            .zip(p1.data_mut().par_chunks_mut(width))
            .zip(p2.data_mut().par_chunks_mut(width))
            .for_each(|((r0, r1), r2)| {
                for x in 0..width {
                    let xyz = ycxcz_to_xyz([r0[x], r1[x], r2[x]], self.white);
                    let lab = linear_rgb_to_hunt_lab(xyz_to_linear_rgb(xyz), self.white);
                    r0[x] = lab[0];
                    r1[x] = lab[1];
                    r2[x] = lab[2];
                }
            });

        planes
    }

    /// Edge and point magnitudes of a luminance plane.
    fn detect_features(&self, luminance: &ScalarImage) -> (ScalarImage, ScalarImage) {
        let k = &self.features;
        let smooth_h = convolve_horizontal(luminance, &k.gaussian);
        let edge_h = convolve_horizontal(luminance, &k.edge);
        let point_h = convolve_horizontal(luminance, &k.point);

        let edge_x = convolve_vertical(&edge_h, &k.gaussian);
        let edge_y = convolve_vertical(&smooth_h, &k.edge);
        let point_x = convolve_vertical(&point_h, &k.gaussian);
        let point_y = convolve_vertical(&smooth_h, &k.point);

        (magnitude(&edge_x, &edge_y), magnitude(&point_x, &point_y))
    }
}

/// Per-pixel Euclidean norm of two component planes.
fn magnitude(a: &ScalarImage, b: &ScalarImage) -> ScalarImage {
    let mut out: ScalarImage = a.same_shape();
    out.data_mut()
        .par_iter_mut()
        .zip(a.data().par_iter().zip(b.data().par_iter()))
        .for_each(|(o, (&x, &y))| *o = (x * x + y * y).sqrt());
    out
}
