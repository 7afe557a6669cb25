//! Occupancy grid built from a single polar scan.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{BinaryMap, GridCell, GridError};
use crate::scan::ScanSample;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Intensity of a cell with no scan sample in it.
pub const EMPTY_INTENSITY: u8 = 0;

/// Intensity of a cell which had at least one scan sample fall into it.
pub const OCCUPIED_INTENSITY: u8 = 255;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A bird's-eye occupancy grid of intensities, `height` rows by `width` columns.
///
/// Columns span the field of view from left to right, rows span the normalised distance from far
/// (row 0) to near (row `height - 1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    data: Array2<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OccupancyGrid {
    /// Create a new grid with every cell empty.
    pub fn empty(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize(width, height));
        }

        Ok(Self {
            data: Array2::from_elem((height, width), EMPTY_INTENSITY),
        })
    }

    /// Build an occupancy grid from a scan.
    ///
    /// Every valid sample marks the cell it falls into as occupied. A sample at `angle_rad` and
    /// `distance` falls into column `floor((angle + fov/2) / fov * width)` and row
    /// `floor((1 - distance) * height)`. Invalid samples and samples which fall outside the grid
    /// are silently dropped.
    pub fn build(
        scan: &[ScanSample],
        width: usize,
        height: usize,
        fov_deg: f64,
    ) -> Result<Self, GridError> {
        if !fov_deg.is_finite() || fov_deg <= 0.0 {
            return Err(GridError::InvalidFov(fov_deg));
        }

        let mut grid = Self::empty(width, height)?;
        let fov_rad = fov_deg.to_radians();

        let mut num_dropped = 0;
        for sample in scan {
            match sample_to_cell(sample, width, height, fov_rad) {
                Some(cell) => grid.data[cell.idx()] = OCCUPIED_INTENSITY,
                None => num_dropped += 1,
            }
        }

        trace!(
            "Built {}x{} grid from {} samples ({} dropped)",
            width,
            height,
            scan.len(),
            num_dropped
        );

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Get the intensity of the given cell, or `None` if it's outside the grid.
    pub fn get(&self, cell: GridCell) -> Option<u8> {
        self.data.get(cell.idx()).copied()
    }

    /// Number of cells marked as occupied.
    pub fn num_occupied(&self) -> usize {
        self.data.iter().filter(|&&v| v == OCCUPIED_INTENSITY).count()
    }

    /// Raw view of the intensities, indexed `[row, col]`.
    pub fn data(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// Threshold this grid into a free/obstacle map.
    ///
    /// Cells with an intensity strictly below `threshold` are free, all others are obstacles.
    pub fn binarize(&self, threshold: u8) -> BinaryMap {
        BinaryMap::from_intensities(self.data.view(), threshold)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the cell a sample falls into, if any.
fn sample_to_cell(
    sample: &ScanSample,
    width: usize,
    height: usize,
    fov_rad: f64,
) -> Option<GridCell> {
    if !sample.is_valid() {
        return None;
    }

    let col = ((sample.angle_rad + fov_rad / 2.0) / fov_rad * width as f64).floor();
    let row = ((1.0 - sample.distance) * height as f64).floor();

    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return None;
    }

    Some(GridCell::new(row as usize, col as usize))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn deg(angle_deg: f64, distance: f64) -> ScanSample {
        ScanSample::new(angle_deg.to_radians(), distance)
    }

    #[test]
    fn test_single_sample() {
        let grid = OccupancyGrid::build(&[deg(0.0, 0.5)], 256, 64, 60.0).unwrap();

        assert_eq!(grid.width(), 256);
        assert_eq!(grid.height(), 64);
        assert_eq!(grid.get(GridCell::new(32, 128)), Some(OCCUPIED_INTENSITY));
        assert_eq!(grid.num_occupied(), 1);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let scan: Vec<_> = (0..30).map(|i| deg(-29.0 + 2.0 * i as f64, 0.3)).collect();

        let a = OccupancyGrid::build(&scan, 256, 64, 60.0).unwrap();
        let b = OccupancyGrid::build(&scan, 256, 64, 60.0).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_empty_scan() {
        let grid = OccupancyGrid::build(&[], 256, 64, 60.0).unwrap();

        assert_eq!(grid.num_occupied(), 0);
        assert!(grid.data().iter().all(|&v| v == EMPTY_INTENSITY));
    }

    #[test]
    fn test_invalid_samples_dropped() {
        let scan = vec![
            // Too close
            deg(0.0, 0.005),
            deg(0.0, 0.01),
            // Beyond the normalised range
            deg(0.0, 1.5),
            // Outside the field of view
            deg(45.0, 0.5),
            deg(-45.0, 0.5),
            // Not numbers
            ScanSample::new(std::f64::NAN, 0.5),
            ScanSample::new(0.0, std::f64::NAN),
        ];

        let grid = OccupancyGrid::build(&scan, 256, 64, 60.0).unwrap();
        assert_eq!(grid.num_occupied(), 0);
    }

    #[test]
    fn test_edges_of_view() {
        // The left edge lands in column 0, a distance of exactly 1 lands in row 0
        let grid = OccupancyGrid::build(&[deg(-30.0, 1.0)], 256, 64, 60.0).unwrap();
        assert_eq!(grid.get(GridCell::new(0, 0)), Some(OCCUPIED_INTENSITY));

        // The right edge floors to `width`, which is outside the grid
        let grid = OccupancyGrid::build(&[deg(30.0, 0.5)], 256, 64, 60.0).unwrap();
        assert_eq!(grid.num_occupied(), 0);

        // Nearest valid distance lands in the last row
        let grid = OccupancyGrid::build(&[deg(0.0, 0.011)], 256, 64, 60.0).unwrap();
        assert_eq!(grid.get(GridCell::new(63, 128)), Some(OCCUPIED_INTENSITY));
    }

    #[test]
    fn test_only_marked_cells_are_occupied() {
        let scan: Vec<_> = (0..50)
            .map(|i| deg(-25.0 + i as f64, 0.1 + 0.015 * i as f64))
            .collect();

        let grid = OccupancyGrid::build(&scan, 256, 64, 60.0).unwrap();
        let expected: std::collections::HashSet<_> = scan
            .iter()
            .filter_map(|s| sample_to_cell(s, 256, 64, 60f64.to_radians()))
            .collect();

        for ((row, col), &v) in grid.data().indexed_iter() {
            let marked = expected.contains(&GridCell::new(row, col));
            assert_eq!(v == OCCUPIED_INTENSITY, marked);
            assert!(v == OCCUPIED_INTENSITY || v == EMPTY_INTENSITY);
        }
        assert_eq!(grid.num_occupied(), expected.len());
    }

    #[test]
    fn test_bad_dimensions() {
        assert!(matches!(
            OccupancyGrid::build(&[], 0, 64, 60.0),
            Err(GridError::ZeroSize(0, 64))
        ));
        assert!(matches!(
            OccupancyGrid::build(&[], 256, 64, 0.0),
            Err(GridError::InvalidFov(_))
        ));
        assert!(matches!(
            OccupancyGrid::build(&[], 256, 64, std::f64::NAN),
            Err(GridError::InvalidFov(_))
        ));
    }

    #[test]
    fn test_binarize() {
        let grid = OccupancyGrid::build(&[deg(0.0, 0.5)], 8, 4, 60.0).unwrap();
        let map = grid.binarize(128);

        assert_eq!(map.width(), 8);
        assert_eq!(map.height(), 4);
        assert!(!map.is_free(GridCell::new(2, 4)));
        assert_eq!(map.num_obstacles(), 1);

        // A threshold of 0 leaves nothing free, a threshold of 255 frees everything but 255
        assert_eq!(grid.binarize(0).num_obstacles(), 32);
        assert_eq!(grid.binarize(255).num_obstacles(), 1);
    }
}
