//! Boolean pixel masks produced by edge detection and dilation.

use crate::error::{Error, Result};

/// A `width * height` grid of flags, indexed `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl EdgeMask {
    /// An all-false mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub(crate) fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cells,
        }
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

    /// Whether `(x, y)` is marked. Out-of-bounds coordinates are never marked.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[self.index(x, y)]
    }

    /// Mark `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when the coordinate lies outside the mask.
    pub fn set(&mut self, x: u32, y: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = self.index(x, y);
        self.cells[idx] = true;
        Ok(())
    }

    /// Number of marked cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// True when nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.cells.contains(&true)
    }

    /// True when every cell marked here is also marked in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the masks differ in size.
    pub fn is_subset_of(&self, other: &Self) -> Result<bool> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(self
            .cells
            .iter()
            .zip(&other.cells)
            .all(|(&mine, &theirs)| !mine || theirs))
    }

    /// Coordinates of marked cells in row-major order.
    pub fn iter_marked(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(move |(i, _)| {
                #[allow(clippy::cast_possible_truncation)]
                ((i % width) as u32, (i / width) as u32)
            })
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.cells
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Offsets of the 8-connected neighbourhood.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// In-bounds 8-neighbours of `(x, y)`; coordinates past the border are skipped.
pub(crate) fn neighbours(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (u32, u32)> {
    NEIGHBOURS.into_iter().filter_map(move |(dx, dy)| {
        let nx = u32::try_from(i64::from(x) + dx).ok()?;
        let ny = u32::try_from(i64::from(y) + dy).ok()?;
        (nx < width && ny < height).then_some((nx, ny))
    })
}
