//! # Autonomy Module
//!
//! This module provides the fusion-and-navigation core of the assistant: turning a scan into an
//! occupancy grid, planning a path across it, and deciding which obstacles along that path should
//! be announced to the user.
//!
//! All processing in here is synchronous and cycle-local, no state is kept between cycles.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Map module - occupancy grids and the binarised free/obstacle map
pub mod map;

/// Defines the grid path type
pub mod path;

/// Navigation module - provides path planning over the binarised map
pub mod nav;

/// Alert module - walks a planned path and raises obstacle alerts
pub mod alert;

/// Parameters for the navigation core
pub mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use alert::{Alert, AlertParams, AlertSimulator, Direction};
pub use map::{BinaryMap, GridCell, GridError, OccupancyGrid};
pub use nav::path_planner::{plan, PlanError, PlanReport};
pub use params::NavParams;
pub use path::Path;
