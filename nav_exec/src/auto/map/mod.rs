//! # Map
//!
//! This module implements the [`OccupancyGrid`] and [`BinaryMap`] types, both of which are dense
//! row-major grids addressed by [`GridCell`].
//!
//! Row 0 of a grid is the far edge of the view and row `height - 1` is the row nearest to the
//! user. Column 0 is the left-most edge of the field of view.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`OccupancyGrid`] type
mod occupancy_grid;

/// Implements the [`BinaryMap`] type
mod binary_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use binary_map::{BinaryMap, FREE, OBSTACLE};
pub use occupancy_grid::{OccupancyGrid, EMPTY_INTENSITY, OCCUPIED_INTENSITY};

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Index of a single cell in a grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Grid dimensions must be non-zero (got {0}x{1})")]
    ZeroSize(usize, usize),

    #[error("Field of view must be a positive finite number of degrees (got {0})")]
    InvalidFov(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan (L1) distance between two cells.
    pub fn manhattan(&self, other: &GridCell) -> usize {
        diff(self.row, other.row) + diff(self.col, other.col)
    }

    /// True if the two cells share an edge.
    pub fn is_adjacent(&self, other: &GridCell) -> bool {
        self.manhattan(other) == 1
    }

    /// Index into an `ndarray::Array2`.
    pub(crate) fn idx(&self) -> [usize; 2] {
        [self.row, self.col]
    }

    /// The 4-connected neighbours of this cell which lie inside a `height` by `width` grid.
    ///
    /// Neighbours are always produced in the order up, down, left, right.
    pub fn neighbours(&self, height: usize, width: usize) -> impl Iterator<Item = GridCell> {
        let up = self.row.checked_sub(1).map(|r| GridCell::new(r, self.col));
        let down = Some(self.row + 1)
            .filter(|&r| r < height)
            .map(|r| GridCell::new(r, self.col));
        let left = self.col.checked_sub(1).map(|c| GridCell::new(self.row, c));
        let right = Some(self.col + 1)
            .filter(|&c| c < width)
            .map(|c| GridCell::new(self.row, c));

        // A cell outside the grid has no valid neighbours in the perpendicular direction either
        let inside = self.row < height && self.col < width;

        vec![up, down, left, right]
            .into_iter()
            .flatten()
            .filter(move |_| inside)
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

fn diff(a: usize, b: usize) -> usize {
    if a > b {
        a - b
    } else {
        b - a
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
