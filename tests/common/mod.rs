//! Shared helpers for the FLIP integration tests.

#![allow(dead_code)]

pub mod generators;

use flip::ColorImage;

/// Wraps generated RGB bytes in a [`ColorImage`].
pub fn image_from_bytes(width: usize, height: usize, rgb: &[u8]) -> ColorImage {
    ColorImage::from_rgb8(width, height, Some(rgb)).expect("generated buffer has the right size")
}
