//! Per-pixel FLIP error computation.
//!
//! Both images go through the same [`FilterBank`]; the filtered responses
//! are then compared pixel by pixel. The color term measures HyAB distance
//! between the Hunt-adjusted CIELAB responses and remaps it so that
//! differences below `PC * cmax` occupy most of the output range. The
//! feature term compares edge and point magnitudes. The two are combined as
//! `color ^ (1 - feature)`, which pushes the error up wherever structure
//! differs even if the mean color barely changes.

use crate::color::{hyab, max_color_distance};
use crate::consts::{PC, PT, QC, QF};
use crate::filter::{FilterBank, FilterResponse};
use crate::image::{ColorImage, ScalarImage};
use rayon::prelude::*;
use std::f32::consts::FRAC_1_SQRT_2;
use tracing::debug;

/// Remaps a color difference (already raised to `QC`) into [0, 1].
#[inline]
fn redistribute(delta: f32, cmax: f32) -> f32 {
    let knee = PC * cmax;
    let mapped = if delta < knee {
        (PT / knee) * delta
    } else {
        PT + (delta - knee) / (cmax - knee) * (1.0 - PT)
    };
    mapped.clamp(0.0, 1.0)
}

/// Color difference between two Hunt-adjusted CIELAB pixels.
#[inline]
fn color_difference(reference: [f32; 3], test: [f32; 3], cmax: f32) -> f32 {
    redistribute(hyab(reference, test).powf(QC), cmax)
}

/// Feature difference from edge and point magnitudes.
#[inline]
fn feature_difference(edge_ref: f32, edge_test: f32, point_ref: f32, point_test: f32) -> f32 {
    let edge = (edge_ref - edge_test).abs();
    let point = (point_ref - point_test).abs();
    (edge.max(point) * FRAC_1_SQRT_2).powf(QF).clamp(0.0, 1.0)
}

#[inline]
fn combine(color: f32, feature: f32) -> f32 {
    color.powf(1.0 - feature).clamp(0.0, 1.0)
}

/// Compares one row of two filter responses.
fn error_row(
    reference: &FilterResponse,
    test: &FilterResponse,
    y: usize,
    cmax: f32,
    out: &mut [f32],
) {
    let [rl, ra, rb] = &reference.lab;
    let [tl, ta, tb] = &test.lab;
    let (rl, ra, rb) = (rl.row(y), ra.row(y), rb.row(y));
    let (tl, ta, tb) = (tl.row(y), ta.row(y), tb.row(y));
    let (re, te) = (reference.edges.row(y), test.edges.row(y));
    let (rp, tp) = (reference.points.row(y), test.points.row(y));

    for (x, value) in out.iter_mut().enumerate() {
        let color = color_difference([rl[x], ra[x], rb[x]], [tl[x], ta[x], tb[x]], cmax);
        let feature = feature_difference(re[x], te[x], rp[x], tp[x]);
        *value = combine(color, feature);
    }
}

/// Computes the error map of two equally sized sRGB-encoded images.
///
/// Callers validate sizes, finiteness and `pixels_per_degree` beforehand.
pub(crate) fn compute_error_map_impl(
    reference: &ColorImage,
    test: &ColorImage,
    pixels_per_degree: f32,
) -> ScalarImage {
    let bank = FilterBank::new(pixels_per_degree);
    debug!(
        width = reference.width(),
        height = reference.height(),
        pixels_per_degree,
        csf_radius = bank.csf_radius(),
        feature_radius = bank.feature_radius(),
        "computing FLIP error map"
    );

    let (ref_response, test_response) =
        rayon::join(|| bank.respond(reference), || bank.respond(test));
    let cmax = max_color_distance();

    let width = reference.width();
    let mut error_map: ScalarImage = reference.same_shape();
    error_map
        .data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| error_row(&ref_response, &test_response, y, cmax, row));

    error_map
}
