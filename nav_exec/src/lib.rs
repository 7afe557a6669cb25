//! # Navigation library.
//!
//! This library allows other crates in the workspace, and the benches, to access items defined
//! inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy module - occupancy grids, path planning and obstacle alerts
pub mod auto;

/// Object detection - labels people, vehicles and buildings in camera frames
pub mod detect;

/// Frame sources - provide camera frames to the scan sources
pub mod frame_source;

/// Executable parameters
pub mod params;

/// Navigation pipeline - the per-cycle processing module
pub mod pipeline;

/// Rendering - draws the navigation state for a sighted observer
pub mod render;

/// Scan sources - produce the polar scans the grid is built from
pub mod scan;

/// Speech - speaks alerts to the user
pub mod speech;
