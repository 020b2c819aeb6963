//! # Trajectory generator library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the trajectory executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion module - jerk limited longitudinal planner and the constraint envelope it respects
pub mod motion;

/// Train control module - automatic station stopping and manual notch control
pub mod train_ctrl;

/// Route module - maps the longitudinal state onto a curved 3D path
pub mod route;

/// Trajectory assembler - builds the per-tick wire records for each user slot
pub mod assembler;

/// Simulator - owns the route, train control and assembler and publishes through a sink
pub mod sim;

/// Tick source - fixed period cycle clock
pub mod tick;

/// Console telecommand source
pub mod console;

/// Global data store for the executable
pub mod data_store;

/// Executable parameters
pub mod params;
