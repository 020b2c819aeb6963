//! # Vehicle parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Datasheet parameters of the simulated vehicle, loaded from `vehicle.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleParams {
    /// Free text description of the vehicle.
    #[serde(default)]
    pub vehicle_type: String,

    /// Line speed of the vehicle.
    ///
    /// Units: kilometers/hour
    pub max_speed_kmh: f64,

    /// Distance between the head and tail user slots.
    ///
    /// Units: meters
    pub length_m: f64,

    /// Maximum traction acceleration, non-negative.
    ///
    /// Units: meters/second^2
    pub traction_accel_mss: f64,

    /// Maximum service braking acceleration, non-positive.
    ///
    /// Units: meters/second^2
    pub braking_accel_mss: f64,

    /// Arc length of the stopping point along the route. If not set the end of the route is
    /// used.
    ///
    /// Units: meters
    #[serde(default)]
    pub station_position_m: Option<f64>
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_vehicle_params() {
        let p: VehicleParams = util::params::from_str(
            "vehicle_type = \"EMU\"\n\
            max_speed_kmh = 120.0\n\
            length_m = 200.0\n\
            traction_accel_mss = 0.6\n\
            braking_accel_mss = -0.9\n"
        ).unwrap();

        assert_eq!(p.vehicle_type, "EMU");
        assert_eq!(p.max_speed_kmh, 120.0);
        assert_eq!(p.station_position_m, None);
    }
}
