//! # Path
//!
//! This module defines the grid path produced by the path planner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

use super::map::GridCell;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// An ordered sequence of grid cells from a start to a goal.
///
/// An empty path means that no path could be found.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Path {
    pub cells: Vec<GridCell>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Create the empty path, meaning "no path found".
    pub fn empty() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn from_cells(cells: Vec<GridCell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first(&self) -> Option<&GridCell> {
        self.cells.first()
    }

    pub fn last(&self) -> Option<&GridCell> {
        self.cells.last()
    }

    /// Number of unit steps in the path, `None` for the empty path.
    pub fn cost(&self) -> Option<usize> {
        self.cells.len().checked_sub(1)
    }

    /// True if every consecutive pair of cells shares an edge.
    pub fn is_four_connected(&self) -> bool {
        self.cells.windows(2).all(|w| w[0].is_adjacent(&w[1]))
    }

    /// Iterate over every `stride`-th cell of the path along with its index, starting at the
    /// first cell. A stride of 0 is treated as 1.
    pub fn iter_stride(&self, stride: usize) -> impl Iterator<Item = (usize, &GridCell)> {
        self.cells.iter().enumerate().step_by(stride.max(1))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
