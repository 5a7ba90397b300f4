//! CPU rendering surface backed by the `image` crate.
//!
//! Used to flatten a [`LayerPair`](crate::LayerPair) into a single raster
//! for export. Blur and layer stacking come straight from
//! [`image::imageops`].

use image::{imageops, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::compositor::{Placement, RenderSurface};
use crate::error::Result;

/// A transparent canvas that collects layers and flattens them by z-order.
#[derive(Debug)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    layers: Vec<(u32, RgbaImage, Placement)>,
}

impl RasterSurface {
    /// An empty, fully transparent surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Stack all drawn layers, lowest z first, onto a transparent canvas.
    ///
    /// Layers with the same z keep their draw order.
    #[must_use]
    pub fn flatten(mut self) -> PixelBuffer {
        self.layers.sort_by_key(|(z, _, _)| *z);
        let mut canvas = RgbaImage::new(self.width, self.height);
        for (_, layer, placement) in &self.layers {
            imageops::overlay(&mut canvas, layer, placement.x, placement.y);
        }
        PixelBuffer::from(canvas)
    }
}

impl RenderSurface for RasterSurface {
    fn draw_blurred(
        &mut self,
        layer: &PixelBuffer,
        radius: f32,
        placement: Placement,
        z: u32,
    ) -> Result<()> {
        let image = layer.clone().into_rgba_image();
        let blurred = if radius > 0.0 {
            imageops::blur(&image, radius)
        } else {
            image
        };
        self.layers.push((z, blurred, placement));
        Ok(())
    }

    fn draw(&mut self, layer: &PixelBuffer, placement: Placement, z: u32) -> Result<()> {
        self.layers
            .push((z, layer.clone().into_rgba_image(), placement));
        Ok(())
    }
}
