//! Image buffer types for FLIP.
//!
//! [`PixelBuffer`] is a dense, row-major grid with immutable dimensions.
//! Two instantiations are used throughout the crate:
//! - [`ColorImage`]: three floating-point channels per pixel (sRGB-encoded
//!   values in 0.0-1.0 for inputs, arbitrary range for intermediates)
//! - [`ScalarImage`]: one floating-point value per pixel (error maps,
//!   filter planes)
//!
//! Rows are stored without padding so whole rows can be handed to rayon
//! as disjoint mutable chunks.

use crate::color::{decode_channel, encode_channel};
use crate::error::{FlipError, Result};
use imgref::{ImgRef, ImgVec};
use rgb::{RGB, RGB8};

/// Dense 2-D grid of pixels of type `T`.
///
/// Cloning produces a fully independent deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

/// Three-channel floating-point image.
pub type ColorImage = PixelBuffer<RGB<f32>>;

/// Single-channel floating-point image.
pub type ScalarImage = PixelBuffer<f32>;

fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(FlipError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl<T: Copy + Default> PixelBuffer<T> {
    /// Creates a zero-initialized (`T::default()`) buffer.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] if width or height is zero.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::filled(width, height, T::default())
    }

    /// Creates a buffer with every pixel set to `value`.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] if width or height is zero.
    pub fn filled(width: usize, height: usize, value: T) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            data: vec![value; width * height],
            width,
            height,
        })
    }

    /// Wraps row-major pixel data.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] for a zero dimension and
    /// [`FlipError::InvalidBufferSize`] if `data.len() != width * height`.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width * height;
        if data.len() != expected {
            return Err(FlipError::InvalidBufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Allocates a default-filled buffer with the same dimensions as `self`.
    pub(crate) fn same_shape<U: Copy + Default>(&self) -> PixelBuffer<U> {
        PixelBuffer {
            data: vec![U::default(); self.data.len()],
            width: self.width,
            height: self.height,
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: buffers have non-zero dimensions.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets a pixel value.
    ///
    /// Coordinates are checked only in debug builds. In release builds an
    /// `x >= width` that still lands inside the buffer reads a pixel from a
    /// following row; callers must pass pre-validated coordinates or use
    /// [`try_get`](Self::try_get).
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} image",
            self.width,
            self.height
        );
        self.data[y * self.width + x]
    }

    /// Sets a pixel value. Same coordinate contract as [`get`](Self::get).
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} image",
            self.width,
            self.height
        );
        self.data[y * self.width + x] = value;
    }

    /// Checked pixel read.
    ///
    /// # Errors
    /// Returns [`FlipError::PixelOutOfBounds`] for coordinates outside the image.
    pub fn try_get(&self, x: usize, y: usize) -> Result<T> {
        self.check_coords(x, y)?;
        Ok(self.data[y * self.width + x])
    }

    /// Checked pixel write.
    ///
    /// # Errors
    /// Returns [`FlipError::PixelOutOfBounds`] for coordinates outside the image.
    pub fn try_set(&mut self, x: usize, y: usize, value: T) -> Result<()> {
        self.check_coords(x, y)?;
        self.data[y * self.width + x] = value;
        Ok(())
    }

    fn check_coords(&self, x: usize, y: usize) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(FlipError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Returns a reference to a row.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable reference to a row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Row-major pixel data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major pixel data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the buffer, returning its row-major pixel data.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Checks if two buffers have the same dimensions.
    #[must_use]
    pub fn same_size<U>(&self, other: &PixelBuffer<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fails with [`FlipError::DimensionMismatch`] unless both buffers match.
    pub(crate) fn check_same_size<U>(&self, other: &PixelBuffer<U>) -> Result<()> {
        if !self.same_size(other) {
            return Err(FlipError::DimensionMismatch {
                w1: self.width,
                h1: self.height,
                w2: other.width,
                h2: other.height,
            });
        }
        Ok(())
    }

    /// Fills the buffer with a constant value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl ColorImage {
    /// Creates a color image from 8-bit row-major RGB bytes.
    ///
    /// Each channel is normalized by dividing by 255. `None` zero-fills.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] for a zero dimension and
    /// [`FlipError::InvalidBufferSize`] if `data` is not exactly
    /// `width * height * 3` bytes.
    pub fn from_rgb8(width: usize, height: usize, data: Option<&[u8]>) -> Result<Self> {
        let mut image = Self::new(width, height)?;
        if let Some(bytes) = data {
            let expected = width * height * 3;
            if bytes.len() != expected {
                return Err(FlipError::InvalidBufferSize {
                    expected,
                    actual: bytes.len(),
                });
            }
            for (px, c) in image.data.iter_mut().zip(bytes.chunks_exact(3)) {
                *px = RGB::new(decode_channel(c[0]), decode_channel(c[1]), decode_channel(c[2]));
            }
        }
        Ok(image)
    }

    /// Creates a color image from an 8-bit `imgref` view (stride aware).
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] for an empty view.
    pub fn from_imgref(img: ImgRef<'_, RGB8>) -> Result<Self> {
        check_dimensions(img.width(), img.height())?;
        let data = img
            .rows()
            .flat_map(|row| row.iter())
            .map(|p| RGB::new(decode_channel(p.r), decode_channel(p.g), decode_channel(p.b)))
            .collect();
        Ok(Self {
            data,
            width: img.width(),
            height: img.height(),
        })
    }

    /// Encodes the image as 8-bit row-major RGB bytes.
    ///
    /// Channels are clamped to [0, 1] and rounded half up; the conversion is
    /// lossy but reproduces bytes that came from [`from_rgb8`](Self::from_rgb8).
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 3);
        for px in &self.data {
            out.push(encode_channel(px.r));
            out.push(encode_channel(px.g));
            out.push(encode_channel(px.b));
        }
        out
    }

    /// Fails with `InvalidParameter` if any channel is NaN or infinite.
    pub(crate) fn check_finite(&self, what: &str) -> Result<()> {
        match self
            .data
            .iter()
            .position(|p| !(p.r.is_finite() && p.g.is_finite() && p.b.is_finite()))
        {
            None => Ok(()),
            Some(index) => Err(FlipError::InvalidParameter(format!(
                "{what} has a non-finite channel at pixel ({}, {})",
                index % self.width,
                index / self.width
            ))),
        }
    }
}

impl ScalarImage {
    /// Creates a scalar image from row-major floats. `None` zero-fills.
    ///
    /// # Errors
    /// Returns [`FlipError::InvalidDimensions`] for a zero dimension and
    /// [`FlipError::InvalidBufferSize`] if `data` is not exactly
    /// `width * height` values.
    pub fn from_floats(width: usize, height: usize, data: Option<&[f32]>) -> Result<Self> {
        match data {
            None => Self::new(width, height),
            Some(values) => Self::from_vec(values.to_vec(), width, height),
        }
    }

    /// Copies the values out in row-major order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone()
    }

    /// Replicates each value into all three channels of a color image.
    #[must_use]
    pub fn to_color(&self) -> ColorImage {
        PixelBuffer {
            data: self.data.iter().map(|&v| RGB::new(v, v, v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Converts into an `imgref` image.
    #[must_use]
    pub fn into_imgvec(self) -> ImgVec<f32> {
        ImgVec::new(self.data, self.width, self.height)
    }
}
