//! Train control module
//!
//! Decides which target the motion planner is given each cycle. In automatic mode a run state
//! machine drives the train from standstill up to line speed and coasts it into the station, in
//! manual mode the operator's notch selects a fraction of the acceleration envelope.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

pub use comms_if::tc::train_ctrl::{ControlMode, Notch};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Velocity tolerance for reaching line speed.
///
/// Units: meters/second
pub const CRUISE_VELOCITY_TOL_MS: f64 = 0.1;

/// Distance before the station at which the train starts coasting.
///
/// Units: meters
pub const COASTING_BUFFER_M: f64 = 500.0;

/// Velocity below which the train is considered stopped.
///
/// Units: meters/second
pub const STOPPED_VELOCITY_MS: f64 = 0.1;

/// Distance to the station within which the train may be declared stopped.
///
/// Units: meters
pub const STOPPED_DISTANCE_M: f64 = 1.0;

/// Overshoot past the station beyond which a stopped train is snapped back onto it.
///
/// Units: meters
pub const SNAP_TOLERANCE_M: f64 = 1.0;

/// Velocity at or below which braking notches are ignored.
///
/// Units: meters/second
pub const STANDSTILL_VELOCITY_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrainCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TrainCtrlError {
    #[error("Time step must be finite and positive, found {0}")]
    InvalidTimeStep(f64),

    #[error("TrainCtrl has not been initialised")]
    NotInitialised,

    #[error("Invalid vehicle parameters: {0}")]
    InvalidVehicle(crate::motion::ConstraintError),

    #[error("Station position must be finite, found {0}")]
    InvalidStation(f64),

    #[error("Could not open the TrainCtrl archive: {0}")]
    ArchiveError(util::archive::ArchiveError)
}
