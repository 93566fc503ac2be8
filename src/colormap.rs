//! Rendering scalar error maps through perceptual color ramps.
//!
//! A ramp is an ordered list of linear-in-index colors. Error `e` selects
//! entry `round(clamp(e, 0, 1) * (len - 1))`, so 0 always maps to the first
//! entry and 1 to the last.

use crate::error::{FlipError, Result};
use crate::image::{ColorImage, ScalarImage};
use rayon::prelude::*;
use rgb::RGB;
use std::fmt;
use std::str::FromStr;

/// Number of entries in a built-in ramp.
pub const BUILTIN_RAMP_LEN: usize = 256;

/// Eleven evenly spaced anchors of the magma palette.
const MAGMA_ANCHORS: [u32; 11] = [
    0x00_0004, 0x14_0e36, 0x3b_0f70, 0x64_1a80, 0x8c_2981, 0xb7_3779, 0xde_4968, 0xf7_705c,
    0xfe_9f6d, 0xfe_cf92, 0xfc_fdbf,
];

/// Eleven evenly spaced anchors of the viridis palette.
const VIRIDIS_ANCHORS: [u32; 11] = [
    0x44_0154, 0x48_2475, 0x41_4487, 0x35_5f8d, 0x2a_788e, 0x21_918c, 0x22_a884, 0x44_bf70,
    0x7a_d151, 0xbd_df26, 0xfd_e725,
];

/// Palettes shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum BuiltinRamp {
    /// Black through purple and orange to pale yellow.
    #[default]
    Magma,
    /// Dark purple through teal to yellow.
    Viridis,
}

impl BuiltinRamp {
    /// Lowercase name accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Magma => "magma",
            Self::Viridis => "viridis",
        }
    }

    fn anchors(self) -> &'static [u32] {
        match self {
            Self::Magma => &MAGMA_ANCHORS,
            Self::Viridis => &VIRIDIS_ANCHORS,
        }
    }
}

impl fmt::Display for BuiltinRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinRamp {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "magma" => Ok(Self::Magma),
            "viridis" => Ok(Self::Viridis),
            _ => Err(FlipError::InvalidParameter(format!(
                "unknown color ramp '{s}'"
            ))),
        }
    }
}

fn hex_to_rgb(hex: u32) -> RGB<f32> {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    RGB::new(channel(16), channel(8), channel(0))
}

/// Linearly interpolates `anchors` into `len` evenly spaced entries.
fn interpolate(anchors: &[u32], len: usize) -> Vec<RGB<f32>> {
    let stops: Vec<RGB<f32>> = anchors.iter().map(|&h| hex_to_rgb(h)).collect();
    let segments = (stops.len() - 1) as f32;

    (0..len)
        .map(|i| {
            let t = i as f32 / (len - 1) as f32 * segments;
            let lo = (t.floor() as usize).min(stops.len() - 2);
            let f = t - lo as f32;
            let (a, b) = (stops[lo], stops[lo + 1]);
            RGB::new(
                a.r * (1.0 - f) + b.r * f,
                a.g * (1.0 - f) + b.g * f,
                a.b * (1.0 - f) + b.b * f,
            )
        })
        .collect()
}

/// Ordered colors a scalar range is rendered through.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    colors: Vec<RGB<f32>>,
}

impl ColorRamp {
    /// 256-entry built-in ramp.
    #[must_use]
    pub fn builtin(ramp: BuiltinRamp) -> Self {
        Self {
            colors: interpolate(ramp.anchors(), BUILTIN_RAMP_LEN),
        }
    }

    /// Built-in ramp looked up by name, case-insensitively.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::builtin(name.parse()?))
    }

    /// Custom ramp from explicit colors.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidParameter`] if `colors` is empty.
    pub fn from_colors(colors: Vec<RGB<f32>>) -> Result<Self> {
        if colors.is_empty() {
            return Err(FlipError::InvalidParameter("color ramp is empty".into()));
        }
        Ok(Self { colors })
    }

    /// Custom ramp read from the first row of an image.
    ///
    /// # Errors
    /// Cannot fail in practice: a [`ColorImage`] always has a width of at
    /// least one, so row 0 is never empty. The signature matches
    /// [`from_colors`](Self::from_colors), which rejects an empty list.
    pub fn from_image(image: &ColorImage) -> Result<Self> {
        Self::from_colors(image.row(0).to_vec())
    }

    /// The ramp as a `len x 1` color image.
    ///
    /// # Errors
    /// Infallible for a constructed ramp, which is never empty.
    pub fn to_image(&self) -> Result<ColorImage> {
        ColorImage::from_vec(self.colors.clone(), self.colors.len(), 1)
    }

    /// Number of entries, always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; present for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entries in order.
    #[must_use]
    pub fn colors(&self) -> &[RGB<f32>] {
        &self.colors
    }

    /// Color for error `e`, clamped to [0, 1]. NaN maps to the first entry.
    #[inline]
    #[must_use]
    pub fn lookup(&self, e: f32) -> RGB<f32> {
        let last = self.colors.len() - 1;
        // `as` saturates and sends NaN to 0.
        let id = (e.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.colors[id.min(last)]
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::builtin(BuiltinRamp::default())
    }
}

/// Builds the named 256-entry ramp as a `256 x 1` image.
///
/// # Errors
/// Returns [`FlipError::InvalidParameter`] for an unknown name.
pub fn builtin_ramp(name: &str) -> Result<ColorImage> {
    ColorRamp::from_name(name)?.to_image()
}

/// Maps every error value through `ramp`.
#[must_use]
pub fn color_map(error_map: &ScalarImage, ramp: &ColorRamp) -> ColorImage {
    let mut out: ColorImage = error_map.same_shape();
    out.data_mut()
        .par_iter_mut()
        .zip(error_map.data().par_iter())
        .for_each(|(dst, &e)| *dst = ramp.lookup(e));
    out
}
