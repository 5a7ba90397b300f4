//! Two-layer rendering contract for a refined cutout.
//!
//! The refined foreground is drawn over a blurred copy of the original so
//! the erased band shows a soft version of the same colours instead of a
//! hard fringe. The blur itself belongs to the [`RenderSurface`]; this
//! module only guarantees that both layers line up pixel for pixel.

use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// Z-order of the blurred backdrop.
pub const BACKDROP_Z: u32 = 0;
/// Z-order of the refined foreground.
pub const FOREGROUND_Z: u32 = 1;

/// Where a layer goes on the surface. Both layers of a pair share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Left edge in surface pixels.
    pub x: i64,
    /// Top edge in surface pixels.
    pub y: i64,
    /// Layer width in pixels.
    pub width: u32,
    /// Layer height in pixels.
    pub height: u32,
}

/// A surface that can draw RGBA layers, optionally blurred.
///
/// Implementations must stack layers by `z`, lower values underneath,
/// regardless of call order.
pub trait RenderSurface {
    /// Draw `layer` blurred by `radius` pixels.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn draw_blurred(
        &mut self,
        layer: &PixelBuffer,
        radius: f32,
        placement: Placement,
        z: u32,
    ) -> Result<()>;

    /// Draw `layer` as is.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn draw(&mut self, layer: &PixelBuffer, placement: Placement, z: u32) -> Result<()>;
}

/// Reject blur radii a surface cannot honour.
pub(crate) fn validate_blur_radius(blur_radius: f32) -> Result<()> {
    if !blur_radius.is_finite() || blur_radius < 0.0 {
        return Err(Error::invalid(
            "blur_radius",
            format!("must be a finite value >= 0, got {blur_radius}"),
        ));
    }
    Ok(())
}

/// A blurred backdrop and a refined foreground of identical dimensions.
#[derive(Debug, Clone)]
pub struct LayerPair {
    backdrop: Arc<PixelBuffer>,
    foreground: PixelBuffer,
    blur_radius: f32,
}

impl LayerPair {
    /// Pair the original image with its refined foreground.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `blur_radius` is negative or
    /// not finite, and [`Error::DimensionMismatch`] if the two rasters differ
    /// in size.
    pub fn new(
        backdrop: Arc<PixelBuffer>,
        foreground: PixelBuffer,
        blur_radius: f32,
    ) -> Result<Self> {
        validate_blur_radius(blur_radius)?;
        if backdrop.dimensions() != foreground.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: backdrop.dimensions(),
                actual: foreground.dimensions(),
            });
        }
        Ok(Self {
            backdrop,
            foreground,
            blur_radius,
        })
    }

    /// The original image, drawn blurred underneath.
    #[must_use]
    pub fn backdrop(&self) -> &PixelBuffer {
        &self.backdrop
    }

    /// Shared handle to the original image.
    #[must_use]
    pub fn backdrop_arc(&self) -> &Arc<PixelBuffer> {
        &self.backdrop
    }

    /// The refined image, drawn on top.
    #[must_use]
    pub fn foreground(&self) -> &PixelBuffer {
        &self.foreground
    }

    /// Take the refined image, e.g. for export.
    #[must_use]
    pub fn into_foreground(self) -> PixelBuffer {
        self.foreground
    }

    /// Backdrop blur radius in pixels.
    #[must_use]
    pub fn blur_radius(&self) -> f32 {
        self.blur_radius
    }

    /// Shared `(width, height)` of both layers.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.foreground.dimensions()
    }

    /// Draw both layers at `(x, y)`: blurred backdrop below, foreground above.
    ///
    /// # Errors
    ///
    /// Propagates surface errors; nothing is retried.
    pub fn present<S: RenderSurface + ?Sized>(&self, surface: &mut S, x: i64, y: i64) -> Result<()> {
        let (width, height) = self.dimensions();
        let placement = Placement {
            x,
            y,
            width,
            height,
        };
        surface.draw_blurred(&self.backdrop, self.blur_radius, placement, BACKDROP_Z)?;
        surface.draw(&self.foreground, placement, FOREGROUND_Z)
    }
}
