//! Constants for the FLIP color pipeline and filter bank.
//!
//! Values are the published LDR-FLIP parameters.

// ============================================================================
// Color Space Constants
// ============================================================================

/// Linear sRGB (D65) to CIE XYZ.
pub const LINEAR_RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
];

/// CIE XYZ to linear sRGB (D65).
pub const XYZ_TO_LINEAR_RGB: [[f32; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// CIELAB threshold `(6/29)^3` between the cube-root and linear segments.
pub const LAB_DELTA_CUBED: f32 = 0.008_856_452;

/// Slope of the linear CIELAB segment, `1 / (3 * (6/29)^2)`.
pub const LAB_LINEAR_SLOPE: f32 = 7.787_037;

/// Offset of the linear CIELAB segment, `4/29`.
pub const LAB_LINEAR_OFFSET: f32 = 0.137_931_03;

// ============================================================================
// Contrast Sensitivity Function
// ============================================================================

/// One Gaussian term `a * sqrt(pi / b) * exp(-pi^2 * d^2 / b)` of a CSF
/// kernel, `d` in degrees of visual angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsfTerm {
    /// Amplitude.
    pub a: f32,
    /// Spread (degrees squared).
    pub b: f32,
}

/// Achromatic (Y) channel CSF.
pub const CSF_ACHROMATIC: &[CsfTerm] = &[CsfTerm { a: 1.0, b: 0.0047 }];

/// Red-green (Cx) channel CSF.
pub const CSF_RED_GREEN: &[CsfTerm] = &[CsfTerm { a: 1.0, b: 0.0053 }];

/// Blue-yellow (Cz) channel CSF, a sum of two Gaussians.
pub const CSF_BLUE_YELLOW: &[CsfTerm] = &[
    CsfTerm { a: 34.1, b: 0.04 },
    CsfTerm { a: 13.5, b: 0.025 },
];

/// Kernel support in standard deviations; taps beyond are negligible.
pub const KERNEL_SUPPORT_SIGMAS: f32 = 3.0;

// ============================================================================
// Feature Detection
// ============================================================================

/// Feature detector Gaussian width in degrees; sigma is half of it.
pub const FEATURE_GAUSSIAN_WIDTH: f32 = 0.082;

// ============================================================================
// Error Combination
// ============================================================================

/// Exponent applied to the HyAB color distance.
pub const QC: f32 = 0.7;

/// Exponent applied to the feature difference.
pub const QF: f32 = 0.5;

/// Fraction of `cmax` below which color differences are compressed.
pub const PC: f32 = 0.4;

/// Error value assigned at the `PC * cmax` knee.
pub const PT: f32 = 0.95;

// ============================================================================
// Viewing Conditions
// ============================================================================

/// Default pixels per degree of visual angle.
///
/// Corresponds roughly to a 0.7 m wide 3840-pixel monitor viewed from 0.7 m.
pub const DEFAULT_PIXELS_PER_DEGREE: f32 = 67.0;

/// Default number of histogram buckets for pooled error summaries.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 100;
