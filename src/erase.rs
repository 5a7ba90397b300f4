//! Alpha erasure of a masked band.

use crate::buffer::{PixelBuffer, ALPHA, CHANNELS};
use crate::error::{Error, Result};
use crate::mask::EdgeMask;

/// Copy `image`, setting alpha to 0 wherever `mask` is marked.
///
/// RGB bytes are kept even under erased alpha so the output can be inspected
/// or re-used. Unmasked pixels are copied verbatim.
///
/// Running the whole pipeline again on the result erases a further band,
/// since erasing exposes a new inner boundary. The output is meant to be
/// consumed once per refinement.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the mask and image differ in size.
pub fn erase_alpha(image: &PixelBuffer, mask: &EdgeMask) -> Result<PixelBuffer> {
    if image.dimensions() != mask.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: image.dimensions(),
            actual: mask.dimensions(),
        });
    }

    let mut pixels = image.as_raw().to_vec();
    let mut erased = 0usize;
    for (px, _) in pixels
        .chunks_exact_mut(CHANNELS)
        .zip(mask.cells())
        .filter(|&(_, &marked)| marked)
    {
        erased += usize::from(px[ALPHA] != 0);
        px[ALPHA] = 0;
    }
    tracing::debug!(erased, "alpha band erased");

    PixelBuffer::new(image.width(), image.height(), pixels)
}
