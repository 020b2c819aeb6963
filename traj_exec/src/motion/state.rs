//! Longitudinal kinematic state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The along-track motion of the train at an instant.
///
/// Position is the arc length travelled along the route. Velocity never goes negative, the
/// train cannot reverse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KinematicState {
    /// Units: meters
    pub position_m: f64,

    /// Units: meters/second
    pub velocity_ms: f64,

    /// Units: meters/second^2
    pub accel_mss: f64,

    /// Units: meters/second^3
    pub jerk_msss: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinematicState {
    /// A state at rest at the given position.
    pub fn at_rest(position_m: f64) -> Self {
        Self {
            position_m,
            ..Default::default()
        }
    }

    /// Advance the state by `dt_s` holding the current jerk constant.
    pub(crate) fn integrate(&mut self, dt_s: f64) {
        let dt2 = dt_s * dt_s;
        let dt3 = dt2 * dt_s;

        self.position_m += self.velocity_ms * dt_s 
            + 0.5 * self.accel_mss * dt2 
            + self.jerk_msss * dt3 / 6.0;
        self.velocity_ms += self.accel_mss * dt_s + 0.5 * self.jerk_msss * dt2;
        self.accel_mss += self.jerk_msss * dt_s;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_integrate_constant_jerk() {
        let mut s = KinematicState {
            position_m: 1.0,
            velocity_ms: 2.0,
            accel_mss: 0.5,
            jerk_msss: 0.25
        };

        s.integrate(2.0);

        // p = 1 + 2*2 + 0.5*0.5*4 + 0.25*8/6
        assert!((s.position_m - (1.0 + 4.0 + 1.0 + 1.0 / 3.0)).abs() < 1e-12);
        // v = 2 + 0.5*2 + 0.5*0.25*4
        assert!((s.velocity_ms - 3.5).abs() < 1e-12);
        assert!((s.accel_mss - 1.0).abs() < 1e-12);
        assert_eq!(s.jerk_msss, 0.25);
    }
}
