//! # Navigation Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{alert::AlertParams, map::GridCell};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the grid builder, path planner and alert simulator.
///
/// Any key missing from the parameter file takes its default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavParams {
    /// Width of the planning grid in cells, spanning the field of view
    pub grid_width: usize,

    /// Height of the planning grid in cells, spanning the normalised distance
    pub grid_height: usize,

    /// Total field of view of the scan in degrees
    pub fov_deg: f64,

    /// Intensity below which a grid cell is free
    pub binarize_threshold: u8,

    /// Only every `alert_stride`-th path cell is checked for obstacles
    pub alert_stride: usize,

    /// Number of cells either side of a path cell, along both axes, checked for obstacles
    pub alert_window_semi_width: usize,

    /// Angles beyond +/- this many degrees are announced as left or right
    pub direction_threshold_deg: f64,

    /// Exponent of the normalised distance to meters conversion
    pub distance_exponent: f64,

    /// Distance in meters corresponding to a normalised distance of 1
    pub max_range_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for NavParams {
    fn default() -> Self {
        let alert = AlertParams::default();

        Self {
            grid_width: 256,
            grid_height: 64,
            fov_deg: alert.fov_deg,
            binarize_threshold: 128,
            alert_stride: alert.stride,
            alert_window_semi_width: alert.window_semi_width,
            direction_threshold_deg: alert.direction_threshold_deg,
            distance_exponent: alert.distance_exponent,
            max_range_m: alert.max_range_m,
        }
    }
}

impl NavParams {
    /// The planning start, the near-left corner of the grid.
    pub fn start_cell(&self) -> GridCell {
        GridCell::new(self.grid_height.saturating_sub(1), 0)
    }

    /// The planning goal, the near-right corner of the grid.
    pub fn goal_cell(&self) -> GridCell {
        GridCell::new(
            self.grid_height.saturating_sub(1),
            self.grid_width.saturating_sub(1),
        )
    }

    /// The alert simulator's view of these parameters.
    pub fn alert_params(&self) -> AlertParams {
        AlertParams {
            fov_deg: self.fov_deg,
            max_range_m: self.max_range_m,
            stride: self.alert_stride,
            window_semi_width: self.alert_window_semi_width,
            direction_threshold_deg: self.direction_threshold_deg,
            distance_exponent: self.distance_exponent,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
