//! Morphological growth of an edge mask into a band.
//!
//! Each pass reads a frozen snapshot and writes a fresh grid, so one pass
//! grows the mask by exactly one pixel of Chebyshev distance. Growing in
//! place would let a freshly marked cell seed further cells within the same
//! pass.

use crate::error::{Error, Result};
use crate::mask::{self, EdgeMask};

/// Grow `mask` into a band `edge_width` pixels wide.
///
/// Runs `edge_width - 1` growth passes; `edge_width == 1` returns the mask
/// unchanged. Every pixel within Chebyshev distance `edge_width - 1` of a
/// marked pixel ends up marked, and a wider band always contains a narrower
/// one.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] when `edge_width` is 0.
#[tracing::instrument(level = "debug", skip(mask), fields(marked = mask.count()))]
pub fn dilate(mask: &EdgeMask, edge_width: u32) -> Result<EdgeMask> {
    if edge_width == 0 {
        return Err(Error::invalid("edge_width", "must be at least 1"));
    }

    let (width, height) = mask.dimensions();
    let mut current = mask.cells().to_vec();
    let mut next = vec![false; current.len()];

    for pass in 1..edge_width {
        if !grow(&current, &mut next, width, height) {
            // Saturated: every later pass would be a no-op.
            tracing::trace!(pass, "dilation reached a fixed point");
            break;
        }
        std::mem::swap(&mut current, &mut next);
    }

    Ok(EdgeMask::from_cells(width, height, current))
}

/// One growth pass: `next = snapshot ∪ neighbours(snapshot)`.
///
/// `next` is cleared first, so it never aliases the grid being scanned.
/// Returns whether any new cell was marked.
fn grow(snapshot: &[bool], next: &mut [bool], width: u32, height: u32) -> bool {
    next.fill(false);
    let row = width as usize;
    let mut changed = false;

    for (idx, _) in snapshot.iter().enumerate().filter(|&(_, &c)| c) {
        next[idx] = true;
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = ((idx % row) as u32, (idx / row) as u32);
        for (nx, ny) in mask::neighbours(x, y, width, height) {
            let n = ny as usize * row + nx as usize;
            changed |= !snapshot[n];
            next[n] = true;
        }
    }

    changed
}
