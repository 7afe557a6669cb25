//! # Alert Simulator
//!
//! Walks a planned path, sampling every `stride`-th cell, and raises a spoken alert for each
//! sampled cell with an obstacle in the small square window around it.
//!
//! The direction of an alert comes from the angle of the sampled column in the field of view, and
//! the distance comes from the scan sample at that same angle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auto::{
    map::{BinaryMap, GridCell},
    path::Path,
};
use crate::scan::{ScanSample, MIN_VALID_DISTANCE};
use util::maths::{clamp, lin_map};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single obstacle alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// The sentence to speak, for example `"Obstacle 1.2 meters ahead."`
    pub text: String,

    pub direction: Direction,

    /// Estimated distance to the obstacle in meters
    pub distance_m: f64,

    /// The path cell which raised the alert
    pub cell: GridCell,

    /// The index of that cell in the path
    pub path_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertParams {
    /// Total field of view of the scan in degrees
    pub fov_deg: f64,

    /// Distance in meters corresponding to a normalised distance of 1
    pub max_range_m: f64,

    /// Only every `stride`-th path cell is checked for obstacles
    pub stride: usize,

    /// Number of cells either side of the path cell, along both axes, checked for obstacles
    pub window_semi_width: usize,

    /// Angles beyond +/- this many degrees are to the side rather than ahead
    pub direction_threshold_deg: f64,

    /// Exponent applied to the normalised distance before scaling by the max range
    pub distance_exponent: f64,
}

#[derive(Debug, Clone)]
pub struct AlertSimulator {
    params: AlertParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ahead,
    Left,
    Right,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("The alert stride must be at least 1")]
    ZeroStride,

    #[error("Field of view must be a positive finite number of degrees (got {0})")]
    InvalidFov(f64),

    #[error("Max range must be a positive finite number of meters (got {0})")]
    InvalidMaxRange(f64),

    #[error("Distance exponent must be a positive finite number (got {0})")]
    InvalidExponent(f64),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Simulate alerts along a path using the default stride, window and direction thresholds.
pub fn simulate(
    map: &BinaryMap,
    path: &Path,
    scan: &[ScanSample],
    fov_deg: f64,
    max_range_m: f64,
) -> Vec<Alert> {
    let sim = AlertSimulator {
        params: AlertParams {
            fov_deg,
            max_range_m,
            ..AlertParams::default()
        },
    };

    sim.simulate(map, path, scan).0
}

/// Convert a normalised distance into meters.
///
/// The distance is clamped to `[MIN_VALID_DISTANCE, 1]`, raised to `exponent`, and scaled by
/// `max_range_m`.
pub fn distance_m(normalised: f64, max_range_m: f64, exponent: f64) -> f64 {
    clamp(&normalised, &MIN_VALID_DISTANCE, &1.0).powf(exponent) * max_range_m
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AlertParams {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            max_range_m: 2.0,
            stride: 5,
            window_semi_width: 2,
            direction_threshold_deg: 10.0,
            distance_exponent: 1.8,
        }
    }
}

impl Default for AlertSimulator {
    fn default() -> Self {
        Self {
            params: AlertParams::default(),
        }
    }
}

impl AlertSimulator {
    pub fn new(params: AlertParams) -> Result<Self, AlertError> {
        if params.stride == 0 {
            return Err(AlertError::ZeroStride);
        }
        if !params.fov_deg.is_finite() || params.fov_deg <= 0.0 {
            return Err(AlertError::InvalidFov(params.fov_deg));
        }
        if !params.max_range_m.is_finite() || params.max_range_m <= 0.0 {
            return Err(AlertError::InvalidMaxRange(params.max_range_m));
        }
        if !params.distance_exponent.is_finite() || params.distance_exponent <= 0.0 {
            return Err(AlertError::InvalidExponent(params.distance_exponent));
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &AlertParams {
        &self.params
    }

    /// Walk the path and return the raised alerts in path order, along with the number of path
    /// cells that were evaluated.
    pub fn simulate(
        &self,
        map: &BinaryMap,
        path: &Path,
        scan: &[ScanSample],
    ) -> (Vec<Alert>, usize) {
        let mut alerts = Vec::new();
        let mut num_evaluated = 0;

        for (path_index, cell) in path.iter_stride(self.params.stride) {
            num_evaluated += 1;

            if let Some(alert) = self.evaluate(map, scan, path_index, *cell) {
                alerts.push(alert);
            }
        }

        (alerts, num_evaluated)
    }

    /// Angle in degrees of the centre of the given column.
    ///
    /// Columns are spread evenly from `-fov/2` (column 0) to `+fov/2` (column `width - 1`).
    pub fn column_angle_deg(&self, col: usize, width: usize) -> f64 {
        let half_fov = self.params.fov_deg / 2.0;
        lin_map((0.0, 1.0), (-half_fov, half_fov), column_fraction(col, width))
    }

    /// Check a single path cell for an obstacle, returning the alert if there is one.
    fn evaluate(
        &self,
        map: &BinaryMap,
        scan: &[ScanSample],
        path_index: usize,
        cell: GridCell,
    ) -> Option<Alert> {
        if !map.window_has_obstacle(cell, self.params.window_semi_width) {
            return None;
        }

        // Find the scan sample at the same angle as this column
        if scan.is_empty() {
            trace!("No scan samples to range obstacle at {}", cell);
            return None;
        }
        let fraction = column_fraction(cell.col, map.width());
        let scan_idx = (fraction * (scan.len() - 1) as f64).round() as usize;
        let sample = scan.get(scan_idx)?;

        if sample.distance.is_nan() {
            trace!("Scan sample {} has no distance", scan_idx);
            return None;
        }

        let angle_deg = self.column_angle_deg(cell.col, map.width());
        let direction = Direction::from_angle(angle_deg, self.params.direction_threshold_deg);
        let distance_m = distance_m(
            sample.distance,
            self.params.max_range_m,
            self.params.distance_exponent,
        );

        Some(Alert::new(direction, distance_m, cell, path_index))
    }
}

impl Alert {
    pub fn new(direction: Direction, distance_m: f64, cell: GridCell, path_index: usize) -> Self {
        Self {
            text: format!("Obstacle {:.1} meters {}.", distance_m, direction),
            direction,
            distance_m,
            cell,
            path_index,
        }
    }
}

impl Direction {
    /// Classify an angle in degrees, negative angles being to the left.
    ///
    /// Angles exactly on the threshold are ahead.
    pub fn from_angle(angle_deg: f64, threshold_deg: f64) -> Self {
        if angle_deg < -threshold_deg {
            Direction::Left
        } else if angle_deg > threshold_deg {
            Direction::Right
        } else {
            Direction::Ahead
        }
    }

    /// The phrase used in spoken alerts.
    pub fn phrase(&self) -> &'static str {
        match self {
            Direction::Ahead => "ahead",
            Direction::Left => "to your left",
            Direction::Right => "to your right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Fraction of the way across the view for the given column, 0 for a single column grid.
fn column_fraction(col: usize, width: usize) -> f64 {
    if width > 1 {
        col as f64 / (width - 1) as f64
    } else {
        0.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::map::OccupancyGrid;
    use crate::auto::nav::path_planner::plan;

    /// A scan with `n` samples evenly spread over a 60 degree view, all at the same distance.
    fn flat_scan(n: usize, distance: f64) -> Vec<ScanSample> {
        util::maths::linspace(-30.0f64, 30.0, n)
            .into_iter()
            .map(|a| ScanSample::new(a.to_radians(), distance))
            .collect()
    }

    fn row_path(row: usize, width: usize) -> Path {
        Path::from_cells((0..width).map(|c| GridCell::new(row, c)).collect())
    }

    #[test]
    fn test_text() {
        let a = Alert::new(Direction::Ahead, 1.2345, GridCell::new(0, 0), 0);
        assert_eq!(a.text, "Obstacle 1.2 meters ahead.");

        let a = Alert::new(Direction::Left, 0.04, GridCell::new(0, 0), 0);
        assert_eq!(a.text, "Obstacle 0.0 meters to your left.");

        let a = Alert::new(Direction::Right, 2.0, GridCell::new(0, 0), 0);
        assert_eq!(a.text, "Obstacle 2.0 meters to your right.");
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::from_angle(0.0, 10.0), Direction::Ahead);
        assert_eq!(Direction::from_angle(10.0, 10.0), Direction::Ahead);
        assert_eq!(Direction::from_angle(-10.0, 10.0), Direction::Ahead);
        assert_eq!(Direction::from_angle(10.1, 10.0), Direction::Right);
        assert_eq!(Direction::from_angle(-10.1, 10.0), Direction::Left);
        assert_eq!(Direction::from_angle(-30.0, 10.0), Direction::Left);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance_m(1.0, 2.0, 1.8), 2.0);
        assert!((distance_m(0.5, 2.0, 1.8) - 0.5f64.powf(1.8) * 2.0).abs() < 1e-12);

        // Clamped at both ends
        assert_eq!(distance_m(5.0, 2.0, 1.8), 2.0);
        assert_eq!(distance_m(0.0, 2.0, 1.8), distance_m(0.01, 2.0, 1.8));
        assert_eq!(distance_m(-1.0, 2.0, 1.8), distance_m(0.01, 2.0, 1.8));

        // Strictly increasing over the valid range
        let mut last = 0.0;
        for i in 1..=100 {
            let d = distance_m(i as f64 / 100.0, 2.0, 1.8);
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_no_obstacles() {
        let map = BinaryMap::all_free(256, 64).unwrap();
        let path = row_path(63, 256);

        let alerts = simulate(&map, &path, &flat_scan(256, 0.5), 60.0, 2.0);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_empty_path() {
        let map = BinaryMap::from_fn(8, 8, |_| false).unwrap();
        let sim = AlertSimulator::new(AlertParams::default()).unwrap();

        let (alerts, num_evaluated) = sim.simulate(&map, &Path::empty(), &flat_scan(8, 0.5));
        assert!(alerts.is_empty());
        assert_eq!(num_evaluated, 0);
    }

    #[test]
    fn test_num_evaluated() {
        let map = BinaryMap::all_free(256, 64).unwrap();
        let sim = AlertSimulator::new(AlertParams::default()).unwrap();

        for len in &[1usize, 4, 5, 6, 10, 11, 256] {
            let path = row_path(63, *len);
            let (_, num_evaluated) = sim.simulate(&map, &path, &[]);
            assert_eq!(num_evaluated, (len + 4) / 5);
        }
    }

    #[test]
    fn test_obstacle_above_path() {
        // Obstacles two rows above the path in columns 0 and 130, one three rows above in
        // column 255 which is outside the window
        let map = BinaryMap::from_fn(256, 64, |c| {
            c != GridCell::new(61, 0) && c != GridCell::new(61, 130) && c != GridCell::new(60, 255)
        })
        .unwrap();
        let path = row_path(63, 256);
        let scan = flat_scan(256, 0.5);

        let alerts = simulate(&map, &path, &scan, 60.0, 2.0);

        // Only indices 0 and 130 are sampled and have an obstacle in their window
        assert_eq!(alerts.len(), 2);

        assert_eq!(alerts[0].path_index, 0);
        assert_eq!(alerts[0].direction, Direction::Left);
        assert_eq!(alerts[0].text, "Obstacle 0.6 meters to your left.");

        assert_eq!(alerts[1].path_index, 130);
        assert_eq!(alerts[1].direction, Direction::Ahead);
        assert!((alerts[1].distance_m - 0.5f64.powf(1.8) * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_beside_path() {
        // Obstacle one row up and two columns across from the first path cell, so not in its
        // column but still inside its window
        let map = BinaryMap::from_fn(16, 64, |c| c != GridCell::new(62, 2)).unwrap();
        let path = row_path(63, 16);

        let alerts = simulate(&map, &path, &flat_scan(16, 0.5), 60.0, 2.0);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].path_index, 0);
        assert_eq!(alerts[0].cell, GridCell::new(63, 0));
        assert_eq!(alerts[0].direction, Direction::Left);
    }

    #[test]
    fn test_obstacle_outside_window_ignored() {
        // Obstacle three rows above the path, beyond the window of every sampled cell
        let map = BinaryMap::from_fn(16, 8, |c| c != GridCell::new(3, 5)).unwrap();
        let path = row_path(6, 16);

        assert!(simulate(&map, &path, &flat_scan(16, 0.5), 60.0, 2.0).is_empty());
    }

    #[test]
    fn test_unsampled_obstacle_ignored() {
        // The path climbs to row 4 and back down. Only index 4, which isn't sampled, has the
        // obstacle at (2, 2) in its window
        let map = BinaryMap::from_fn(16, 8, |c| c != GridCell::new(2, 2)).unwrap();
        let path = Path::from_cells(vec![
            GridCell::new(7, 0),
            GridCell::new(6, 0),
            GridCell::new(5, 0),
            GridCell::new(4, 0),
            GridCell::new(4, 1),
            GridCell::new(5, 1),
        ]);

        assert!(map.window_has_obstacle(path.cells[4], 2));
        assert!(simulate(&map, &path, &flat_scan(16, 0.5), 60.0, 2.0).is_empty());
    }

    #[test]
    fn test_empty_scan_skips_alerts() {
        let map = BinaryMap::from_fn(16, 8, |c| c.row != 5).unwrap();
        let path = row_path(6, 16);

        assert!(simulate(&map, &path, &[], 60.0, 2.0).is_empty());
    }

    #[test]
    fn test_short_scan_uses_angle() {
        // A three sample scan against a 256 column map, each sample at a different distance
        let scan = vec![
            ScanSample::new((-30f64).to_radians(), 0.2),
            ScanSample::new(0.0, 0.5),
            ScanSample::new(30f64.to_radians(), 0.9),
        ];
        let map = BinaryMap::from_fn(256, 64, |c| c.row != 62).unwrap();
        let path = row_path(63, 256);

        let alerts = simulate(&map, &path, &scan, 60.0, 2.0);

        // Every sampled cell has an obstacle just above it
        assert_eq!(alerts.len(), 52);
        assert_eq!(alerts[0].distance_m, distance_m(0.2, 2.0, 1.8));
        assert_eq!(alerts[25].distance_m, distance_m(0.5, 2.0, 1.8));
        assert_eq!(alerts[51].distance_m, distance_m(0.9, 2.0, 1.8));
        assert_eq!(alerts[51].direction, Direction::Right);
    }

    #[test]
    fn test_alerts_are_in_path_order() {
        // Samples land in row 61, inside the window of the bottom row
        let scan = flat_scan(256, 0.04);
        let grid = OccupancyGrid::build(&scan, 256, 64, 60.0).unwrap();
        let map = grid.binarize(128);
        let path = plan(&map, GridCell::new(63, 0), GridCell::new(63, 255)).unwrap();

        let (alerts, _) = AlertSimulator::new(AlertParams::default())
            .unwrap()
            .simulate(&map, &path, &scan);

        assert!(!alerts.is_empty());
        assert!(alerts.windows(2).all(|w| w[0].path_index < w[1].path_index));
        for a in alerts.iter() {
            assert!(a.text.starts_with("Obstacle "));
            assert!(a.text.ends_with('.'));
        }
    }

    #[test]
    fn test_bad_params() {
        let bad = |p: AlertParams| AlertSimulator::new(p).is_err();

        assert!(bad(AlertParams {
            stride: 0,
            ..Default::default()
        }));
        assert!(bad(AlertParams {
            fov_deg: -1.0,
            ..Default::default()
        }));
        assert!(bad(AlertParams {
            max_range_m: 0.0,
            ..Default::default()
        }));
        assert!(bad(AlertParams {
            distance_exponent: std::f64::NAN,
            ..Default::default()
        }));
    }
}
