//! Binary free/obstacle map used for planning and alerting.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{GridCell, GridError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Value of a traversable cell.
pub const FREE: u8 = 1;

/// Value of a blocked cell.
pub const OBSTACLE: u8 = 0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A grid where every cell is either [`FREE`] or [`OBSTACLE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMap {
    data: Array2<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BinaryMap {
    /// Threshold a grid of intensities. Values strictly below `threshold` become free.
    pub(crate) fn from_intensities(intensities: ArrayView2<u8>, threshold: u8) -> Self {
        Self {
            data: intensities.mapv(|v| if v < threshold { FREE } else { OBSTACLE }),
        }
    }

    /// Build a map by evaluating `is_free` on every cell.
    pub fn from_fn<F>(width: usize, height: usize, mut is_free: F) -> Result<Self, GridError>
    where
        F: FnMut(GridCell) -> bool,
    {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize(width, height));
        }

        Ok(Self {
            data: Array2::from_shape_fn((height, width), |(row, col)| {
                if is_free(GridCell::new(row, col)) {
                    FREE
                } else {
                    OBSTACLE
                }
            }),
        })
    }

    /// Build a map with no obstacles.
    pub fn all_free(width: usize, height: usize) -> Result<Self, GridError> {
        Self::from_fn(width, height, |_| true)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// True if the cell lies inside the map.
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.row < self.height() && cell.col < self.width()
    }

    /// True if the cell is inside the map and free. Cells outside the map are never free.
    pub fn is_free(&self, cell: GridCell) -> bool {
        self.get(cell) == Some(FREE)
    }

    pub fn get(&self, cell: GridCell) -> Option<u8> {
        self.data.get(cell.idx()).copied()
    }

    pub fn num_obstacles(&self) -> usize {
        self.data.iter().filter(|&&v| v == OBSTACLE).count()
    }

    /// True if any cell within `semi_width` cells of `centre` on both axes is an obstacle.
    ///
    /// The window is the square `centre.row - semi_width ..= centre.row + semi_width` by
    /// `centre.col - semi_width ..= centre.col + semi_width`, clipped to the map. A centre outside
    /// the map has no obstacles around it.
    pub fn window_has_obstacle(&self, centre: GridCell, semi_width: usize) -> bool {
        if !self.contains(centre) {
            return false;
        }

        let first_row = centre.row.saturating_sub(semi_width);
        let last_row = centre.row.saturating_add(semi_width).min(self.height() - 1);
        let first_col = centre.col.saturating_sub(semi_width);
        let last_col = centre.col.saturating_add(semi_width).min(self.width() - 1);

        self.data
            .slice(s![first_row..=last_row, first_col..=last_col])
            .iter()
            .any(|&v| v == OBSTACLE)
    }

    /// Raw view of the map, indexed `[row, col]`.
    pub fn data(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_threshold() {
        let grid = arr2(&[[0u8, 127, 128], [255, 64, 200]]);
        let map = BinaryMap::from_intensities(grid.view(), 128);

        assert_eq!(map.data(), arr2(&[[1u8, 1, 0], [0, 1, 0]]));
        assert!(map.data().iter().all(|&v| v == FREE || v == OBSTACLE));
    }

    #[test]
    fn test_outside_is_not_free() {
        let map = BinaryMap::all_free(4, 3).unwrap();

        assert!(map.is_free(GridCell::new(2, 3)));
        assert!(!map.is_free(GridCell::new(3, 0)));
        assert!(!map.is_free(GridCell::new(0, 4)));
        assert!(!map.contains(GridCell::new(3, 0)));
        assert_eq!(map.get(GridCell::new(0, 4)), None);
    }

    #[test]
    fn test_window() {
        // Single obstacle at (5, 4) in a 10x10 map
        let map = BinaryMap::from_fn(10, 10, |c| c != GridCell::new(5, 4)).unwrap();

        // Window is inclusive on both ends of both axes
        assert!(map.window_has_obstacle(GridCell::new(3, 4), 2));
        assert!(map.window_has_obstacle(GridCell::new(7, 4), 2));
        assert!(map.window_has_obstacle(GridCell::new(5, 2), 2));
        assert!(map.window_has_obstacle(GridCell::new(5, 6), 2));
        assert!(map.window_has_obstacle(GridCell::new(3, 6), 2));
        assert!(!map.window_has_obstacle(GridCell::new(8, 4), 2));
        assert!(!map.window_has_obstacle(GridCell::new(5, 7), 2));
        assert!(!map.window_has_obstacle(GridCell::new(2, 1), 2));

        // A zero width window is just the centre cell
        assert!(map.window_has_obstacle(GridCell::new(5, 4), 0));
        assert!(!map.window_has_obstacle(GridCell::new(5, 5), 0));

        // Clipped at the edges
        let map = BinaryMap::from_fn(4, 10, |c| c != GridCell::new(0, 0)).unwrap();
        assert!(map.window_has_obstacle(GridCell::new(1, 2), 2));
        assert!(!map.window_has_obstacle(GridCell::new(9, 0), 2));
        assert!(!map.window_has_obstacle(GridCell::new(0, 7), 2));
    }

    #[test]
    fn test_zero_size() {
        assert!(matches!(
            BinaryMap::all_free(0, 3),
            Err(GridError::ZeroSize(0, 3))
        ));
    }
}
