//! Alpha boundary detection.
//!
//! A pixel sits on the boundary when it is not fully transparent and at
//! least one of its 8-connected neighbours is. Only the opaque side of the
//! boundary is marked, so the band is always carved out of the foreground.

use crate::buffer::PixelBuffer;
use crate::mask::{self, EdgeMask};

/// Mark every pixel with `alpha > 0` that touches a pixel with `alpha == 0`.
///
/// Neighbours past the border are ignored: they neither mark nor suppress an
/// edge. A 1x1 buffer, or one without any alpha variation, yields an empty
/// mask.
#[must_use]
#[tracing::instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_edges(image: &PixelBuffer) -> EdgeMask {
    let (width, height) = image.dimensions();
    let alpha: Vec<u8> = image.alphas().collect();
    let at = |x: u32, y: u32| alpha[y as usize * width as usize + x as usize];

    let mut cells = Vec::with_capacity(alpha.len());
    for y in 0..height {
        for x in 0..width {
            let edge = at(x, y) > 0
                && mask::neighbours(x, y, width, height).any(|(nx, ny)| at(nx, ny) == 0);
            cells.push(edge);
        }
    }

    let mask = EdgeMask::from_cells(width, height, cells);
    tracing::debug!(edge_pixels = mask.count(), "edge detection finished");
    mask
}
