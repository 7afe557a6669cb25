//! # Navigation
//!
//! This module provides path planning over the binarised map. Paths are planned on a 4-connected
//! grid with unit step costs, from the near-left corner of the view to the near-right corner.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// A* planner over a [`BinaryMap`](crate::auto::map::BinaryMap)
pub mod path_planner;
