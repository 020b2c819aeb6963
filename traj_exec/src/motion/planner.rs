//! Jerk limited longitudinal planner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::{clamp, sign};

use super::{KinematicState, MotionConstraints};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Advances a [`KinematicState`] towards a target velocity or acceleration.
///
/// The only state held by the planner is its two targets. Given the same targets, time step and
/// prior state both advance functions always produce the same new state.
#[derive(Debug, Clone)]
pub struct MotionPlanner {
    constraints: MotionConstraints,

    target_velocity_ms: f64,

    target_accel_mss: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionPlanner {
    pub fn new(constraints: MotionConstraints) -> Self {
        Self {
            constraints,
            target_velocity_ms: 0.0,
            target_accel_mss: 0.0
        }
    }

    pub fn constraints(&self) -> &MotionConstraints {
        &self.constraints
    }

    /// Set the target velocity, clamped to `[0, max_velocity]`.
    pub fn set_target_velocity(&mut self, velocity_ms: f64) {
        self.target_velocity_ms = clamp(
            &velocity_ms, 
            &0.0, 
            &self.constraints.max_velocity_ms()
        );
    }

    /// Set the target acceleration, clamped to `[min_accel, max_accel]`.
    pub fn set_target_acceleration(&mut self, accel_mss: f64) {
        self.target_accel_mss = clamp(
            &accel_mss,
            &self.constraints.min_accel_mss(),
            &self.constraints.max_accel_mss()
        );
    }

    pub fn target_velocity_ms(&self) -> f64 {
        self.target_velocity_ms
    }

    pub fn target_accel_mss(&self) -> f64 {
        self.target_accel_mss
    }

    /// Advance the state by one step towards the target velocity.
    ///
    /// Full authority acceleration is commanded while the velocity error is larger than the
    /// velocity change needed to bring the current acceleration back to zero at the top jerk
    /// tier, after which the acceleration is levelled off so the velocity converges without
    /// overshoot.
    pub fn advance_by_velocity(&self, dt_s: f64, state: &mut KinematicState) {
        let velocity_error = self.target_velocity_ms - state.velocity_ms;

        let decay_time_s = state.accel_mss / self.constraints.top_jerk_msss();
        let decay_dv = 0.5 * state.accel_mss * decay_time_s;

        let ideal_accel = if velocity_error.abs() > decay_dv.abs() {
            if velocity_error > 0.0 {
                self.constraints.max_accel_mss()
            }
            else {
                self.constraints.min_accel_mss()
            }
        }
        else {
            0.0
        };

        trace!(
            "Velocity error {:.6} m/s, decay dv {:.6} m/s, ideal accel {:.3} m/s^2",
            velocity_error, decay_dv, ideal_accel
        );

        self.step(ideal_accel, dt_s, state);
    }

    /// Advance the state by one step towards the target acceleration.
    pub fn advance_by_acceleration(&self, dt_s: f64, state: &mut KinematicState) {
        self.step(self.target_accel_mss, dt_s, state);

        // Sustained positive acceleration at the velocity ceiling would keep pushing the
        // integrator past it.
        if state.velocity_ms >= self.constraints.max_velocity_ms() && state.accel_mss > 0.0 {
            state.accel_mss = 0.0;
            state.jerk_msss = 0.0;
        }
    }

    /// Close the gap to `target_accel` with the top jerk tier, integrate and clamp.
    fn step(&self, target_accel_mss: f64, dt_s: f64, state: &mut KinematicState) {
        let max_jerk = self.constraints.top_jerk_msss();
        let accel_error = target_accel_mss - state.accel_mss;

        if accel_error.abs() < max_jerk * dt_s {
            state.accel_mss = target_accel_mss;
            state.jerk_msss = 0.0;
        }
        else {
            state.jerk_msss = sign(accel_error) * max_jerk;
        }

        state.integrate(dt_s);

        state.accel_mss = clamp(
            &state.accel_mss,
            &self.constraints.min_accel_mss(),
            &self.constraints.max_accel_mss()
        );
        state.velocity_ms = clamp(
            &state.velocity_ms,
            &0.0,
            &self.constraints.max_velocity_ms()
        );
    }
}
