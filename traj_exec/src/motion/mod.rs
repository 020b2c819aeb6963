//! Motion module
//!
//! Advances the longitudinal [`KinematicState`] of the train by one time step under a
//! jerk-limited control law. The [`MotionPlanner`] holds a target velocity (automatic driving)
//! and a target acceleration (manual driving), both clamped to the [`MotionConstraints`] when
//! set.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod constraints;
mod planner;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use constraints::*;
pub use planner::*;
pub use state::*;
