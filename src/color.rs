//! Color conversions used by FLIP.
//!
//! Input images carry sRGB-encoded channels in 0.0-1.0. The metric works in
//! two derived spaces:
//! - YCxCz: a linearized CIELAB opponent space (Y achromatic, Cx red-green,
//!   Cz blue-yellow) in which the contrast sensitivity filters are applied
//! - Hunt-adjusted CIELAB: CIELAB with chroma scaled by lightness, in which
//!   the HyAB color distance is measured
//!
//! Both use the XYZ of linear RGB white `(1, 1, 1)` as reference white.

use crate::consts::{
    LAB_DELTA_CUBED, LAB_LINEAR_OFFSET, LAB_LINEAR_SLOPE, LINEAR_RGB_TO_XYZ, QC,
    XYZ_TO_LINEAR_RGB,
};

/// Normalizes an 8-bit channel to 0.0-1.0.
#[inline]
#[must_use]
pub fn decode_channel(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Encodes a normalized channel to 8 bits.
///
/// The value is clamped to [0, 1], scaled by 255 and rounded half up
/// (`floor(v * 255 + 0.5)`). NaN encodes to 0.
#[inline]
#[must_use]
pub fn encode_channel(v: f32) -> u8 {
    // Float-to-int `as` saturates, so 255.5 lands on 255.
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Applies sRGB gamma decoding (sRGB to linear RGB).
///
/// The sRGB transfer function is a piecewise function:
/// - Linear for very dark values (v <= 0.04045)
/// - Power function for the rest
#[inline]
#[must_use]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Applies sRGB gamma encoding (linear RGB to sRGB).
#[inline]
#[must_use]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn mul3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Converts linear RGB to CIE XYZ.
#[inline]
#[must_use]
pub fn linear_rgb_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    mul3(&LINEAR_RGB_TO_XYZ, rgb)
}

/// Converts CIE XYZ to linear RGB.
#[inline]
#[must_use]
pub fn xyz_to_linear_rgb(xyz: [f32; 3]) -> [f32; 3] {
    mul3(&XYZ_TO_LINEAR_RGB, xyz)
}

/// XYZ of linear RGB white, the reference white for YCxCz and CIELAB.
#[inline]
#[must_use]
pub fn reference_white() -> [f32; 3] {
    linear_rgb_to_xyz([1.0, 1.0, 1.0])
}

/// Converts CIE XYZ to YCxCz.
#[inline]
#[must_use]
pub fn xyz_to_ycxcz(xyz: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let xr = xyz[0] / white[0];
    let yr = xyz[1] / white[1];
    let zr = xyz[2] / white[2];
    [116.0 * yr - 16.0, 500.0 * (xr - yr), 200.0 * (yr - zr)]
}

/// Converts YCxCz to CIE XYZ.
#[inline]
#[must_use]
pub fn ycxcz_to_xyz(ycxcz: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let yr = (ycxcz[0] + 16.0) / 116.0;
    let xr = ycxcz[1] / 500.0 + yr;
    let zr = yr - ycxcz[2] / 200.0;
    [xr * white[0], yr * white[1], zr * white[2]]
}

/// Relative luminance carried by the Y component of YCxCz.
#[inline]
#[must_use]
pub fn ycxcz_luminance(y: f32) -> f32 {
    (y + 16.0) / 116.0
}

/// Converts sRGB-encoded channels straight to YCxCz.
#[inline]
#[must_use]
pub fn srgb_to_ycxcz(rgb: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let linear = [
        srgb_to_linear(rgb[0]),
        srgb_to_linear(rgb[1]),
        srgb_to_linear(rgb[2]),
    ];
    xyz_to_ycxcz(linear_rgb_to_xyz(linear), white)
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_DELTA_CUBED {
        t.cbrt()
    } else {
        LAB_LINEAR_SLOPE * t + LAB_LINEAR_OFFSET
    }
}

/// Converts CIE XYZ to CIELAB.
#[inline]
#[must_use]
pub fn xyz_to_lab(xyz: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / white[0]);
    let fy = lab_f(xyz[1] / white[1]);
    let fz = lab_f(xyz[2] / white[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Scales CIELAB chroma by lightness (Hunt effect).
#[inline]
#[must_use]
pub fn hunt_adjust(lab: [f32; 3]) -> [f32; 3] {
    let scale = 0.01 * lab[0];
    [lab[0], scale * lab[1], scale * lab[2]]
}

/// Converts linear RGB to Hunt-adjusted CIELAB, clamping RGB to [0, 1] first.
#[inline]
#[must_use]
pub fn linear_rgb_to_hunt_lab(rgb: [f32; 3], white: [f32; 3]) -> [f32; 3] {
    let clamped = [
        rgb[0].clamp(0.0, 1.0),
        rgb[1].clamp(0.0, 1.0),
        rgb[2].clamp(0.0, 1.0),
    ];
    hunt_adjust(xyz_to_lab(linear_rgb_to_xyz(clamped), white))
}

/// HyAB distance: city-block in lightness, Euclidean in chroma.
#[inline]
#[must_use]
pub fn hyab(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dl = a[0] - b[0];
    let da = a[1] - b[1];
    let db = a[2] - b[2];
    dl.abs() + (da * da + db * db).sqrt()
}

/// Largest color distance the metric expects: HyAB between pure green and
/// pure blue, raised to the color exponent.
#[must_use]
pub fn max_color_distance() -> f32 {
    let white = reference_white();
    let green = linear_rgb_to_hunt_lab([0.0, 1.0, 0.0], white);
    let blue = linear_rgb_to_hunt_lab([0.0, 0.0, 1.0], white);
    hyab(green, blue).powf(QC)
}
