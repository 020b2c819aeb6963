//! Vehicle motion envelope

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use crate::train_ctrl::VehicleParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of comfort jerk tiers in the constraint table.
pub const NUM_JERK_TIERS: usize = 3;

/// Index of the jerk tier used by the planner.
pub const TOP_JERK_TIER: usize = NUM_JERK_TIERS - 1;

/// Conversion factor from km/h to m/s.
const KMH_PER_MS: f64 = 3.6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The physical envelope of a vehicle.
///
/// Only the top jerk tier is read by the planner, the lower tiers are kept for
/// gear selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionConstraints {
    /// Units: meters/second
    max_velocity_ms: f64,

    /// Units: meters/second^2
    max_accel_mss: f64,

    /// Units: meters/second^2, always negative or zero
    min_accel_mss: f64,

    /// Units: meters/second^3, ordered from lowest to highest tier
    max_jerk_msss: [f64; NUM_JERK_TIERS]
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building an invalid constraint envelope.
#[derive(Debug, Error, PartialEq)]
pub enum ConstraintError {
    #[error("Maximum velocity must be finite and non-negative, found {0}")]
    InvalidMaxVelocity(f64),

    #[error("Maximum acceleration must be finite and non-negative, found {0}")]
    InvalidMaxAccel(f64),

    #[error("Minimum acceleration must be finite and non-positive, found {0}")]
    InvalidMinAccel(f64),

    #[error("Jerk tier {0} must be finite and positive, found {1}")]
    InvalidJerk(usize, f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionConstraints {
    /// Build a new constraint envelope, checking `min_accel <= 0 <= max_accel`.
    pub fn new(
        max_velocity_ms: f64,
        max_accel_mss: f64,
        min_accel_mss: f64,
        max_jerk_msss: [f64; NUM_JERK_TIERS]
    ) -> Result<Self, ConstraintError> {
        if !max_velocity_ms.is_finite() || max_velocity_ms < 0.0 {
            return Err(ConstraintError::InvalidMaxVelocity(max_velocity_ms))
        }
        if !max_accel_mss.is_finite() || max_accel_mss < 0.0 {
            return Err(ConstraintError::InvalidMaxAccel(max_accel_mss))
        }
        if !min_accel_mss.is_finite() || min_accel_mss > 0.0 {
            return Err(ConstraintError::InvalidMinAccel(min_accel_mss))
        }
        for (i, j) in max_jerk_msss.iter().enumerate() {
            if !j.is_finite() || *j <= 0.0 {
                return Err(ConstraintError::InvalidJerk(i, *j))
            }
        }

        Ok(Self {
            max_velocity_ms,
            max_accel_mss,
            min_accel_mss,
            max_jerk_msss
        })
    }

    /// Derive the envelope from the vehicle's datasheet values.
    ///
    /// The top jerk tier spans the full acceleration range in two seconds, the middle and low
    /// tiers are two thirds and one third of it.
    pub fn from_vehicle(vehicle: &VehicleParams) -> Result<Self, ConstraintError> {
        let max_accel = vehicle.traction_accel_mss;
        let min_accel = vehicle.braking_accel_mss;
        let top_jerk = (max_accel - min_accel) / 2.0;

        Self::new(
            vehicle.max_speed_kmh / KMH_PER_MS,
            max_accel,
            min_accel,
            [top_jerk / 3.0, top_jerk * 2.0 / 3.0, top_jerk]
        )
    }

    pub fn max_velocity_ms(&self) -> f64 {
        self.max_velocity_ms
    }

    pub fn max_accel_mss(&self) -> f64 {
        self.max_accel_mss
    }

    pub fn min_accel_mss(&self) -> f64 {
        self.min_accel_mss
    }

    /// The jerk limit of the given tier, `None` if the tier doesn't exist.
    pub fn max_jerk_msss(&self, tier: usize) -> Option<f64> {
        self.max_jerk_msss.get(tier).copied()
    }

    /// The jerk limit used by the planner.
    pub fn top_jerk_msss(&self) -> f64 {
        self.max_jerk_msss[TOP_JERK_TIER]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn demo_vehicle() -> VehicleParams {
        VehicleParams {
            vehicle_type: "demo".into(),
            max_speed_kmh: 120.0,
            length_m: 200.0,
            traction_accel_mss: 0.6,
            braking_accel_mss: -0.9,
            station_position_m: None
        }
    }

    #[test]
    fn test_from_vehicle() {
        let c = MotionConstraints::from_vehicle(&demo_vehicle()).unwrap();

        assert!((c.max_velocity_ms() - 33.333_333_333).abs() < 1e-6);
        assert_eq!(c.max_accel_mss(), 0.6);
        assert_eq!(c.min_accel_mss(), -0.9);
        assert!((c.top_jerk_msss() - 0.75).abs() < 1e-12);
        assert!((c.max_jerk_msss(1).unwrap() - 0.5).abs() < 1e-12);
        assert!((c.max_jerk_msss(0).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(c.max_jerk_msss(3), None);
    }

    #[test]
    fn test_invalid_envelopes() {
        assert_eq!(
            MotionConstraints::new(-1.0, 1.0, -1.0, [0.5; 3]),
            Err(ConstraintError::InvalidMaxVelocity(-1.0))
        );
        assert_eq!(
            MotionConstraints::new(20.0, -1.0, -1.0, [0.5; 3]),
            Err(ConstraintError::InvalidMaxAccel(-1.0))
        );
        assert_eq!(
            MotionConstraints::new(20.0, 1.0, 0.5, [0.5; 3]),
            Err(ConstraintError::InvalidMinAccel(0.5))
        );
        assert_eq!(
            MotionConstraints::new(20.0, 1.0, -1.0, [0.25, 0.5, 0.0]),
            Err(ConstraintError::InvalidJerk(2, 0.0))
        );

        let mut v = demo_vehicle();
        v.braking_accel_mss = 0.9;
        assert!(MotionConstraints::from_vehicle(&v).is_err());
    }
}
