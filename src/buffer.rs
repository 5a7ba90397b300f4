//! RGBA8 pixel buffer shared by every pipeline stage.
//!
//! Pixels are stored row-major, four bytes each, in `R, G, B, A` order. A
//! buffer is never mutated after construction: stages read one buffer and
//! build a fresh one.

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, ExpectedLen, Result};

/// Number of bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Offset of the alpha byte inside a pixel.
pub(crate) const ALPHA: usize = 3;

/// An immutable, dimension-checked RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap decoded RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] unless `pixels.len() == width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if expected != Some(pixels.len()) {
            return Err(Error::BufferSize {
                width,
                height,
                expected: expected.map_or(ExpectedLen::Overflow, ExpectedLen::Bytes),
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Convert any decoded raster to RGBA8.
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from(image.to_rgba8())
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (`width * height`).
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / CHANNELS
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the buffer, returning its RGBA bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// Alpha at `(x, y)`.
    ///
    /// Reads are never clamped: callers reading neighbours must check bounds first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `x >= width` or `y >= height`.
    pub fn alpha(&self, x: u32, y: u32) -> Result<u8> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.pixels[self.index(x, y) * CHANNELS + ALPHA])
    }

    /// Alpha bytes in row-major order.
    pub(crate) fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels.chunks_exact(CHANNELS).map(|px| px[ALPHA])
    }

    /// Build an [`RgbaImage`] for the encode side of the pipeline.
    #[must_use]
    pub fn into_rgba_image(self) -> RgbaImage {
        // Length is checked at construction, so this cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| unreachable!("pixel buffer length invariant"))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }
}

fn byte_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(CHANNELS)
}
