//! # Navigation Executable Parameters
//!
//! This module provide parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{detect::DetectionParams, scan::SimScanParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavExecParams {
    /// Target period of one cycle in seconds
    pub cycle_period_s: f64,

    /// Position of the pseudo-lidar scan row as a fraction of the frame height
    pub scan_line_ratio: f64,

    /// Size frames are resized to on capture
    pub frame_width: u32,
    pub frame_height: u32,

    /// Size of the colour mapped bird's-eye view
    pub display_width: u32,
    pub display_height: u32,

    /// Render images every this many cycles, 0 to disable
    pub render_interval_cycles: u64,

    /// Save a JSON snapshot of the pipeline output every this many cycles, 0 to disable
    pub save_interval_cycles: u64,

    /// Speech engine executable
    pub speech_command: String,

    /// Voice passed to the speech engine
    pub speech_voice: String,

    pub detection: DetectionParams,

    /// Synthetic scan source used with `--sim`
    pub sim: SimScanParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            scan_line_ratio: 0.6,
            frame_width: 640,
            frame_height: 480,
            display_width: 512,
            display_height: 128,
            render_interval_cycles: 10,
            save_interval_cycles: 50,
            speech_command: "espeak".into(),
            speech_voice: "en-us".into(),
            detection: DetectionParams::default(),
            sim: SimScanParams::default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
