//! # Simulator
//!
//! Owns the route, the train controller and the assembler, and publishes everything they produce
//! through a `TrajSink`. The simulation only advances between a `start` and a `stop`, mode and
//! notch commands are accepted at any time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use thiserror::Error;

// Internal
use comms_if::{
    net::{TrajSocket, TrajSocketError},
    traj::{self, StopCommand, Wire}
};
use util::{module::State, archive::Archived};
use crate::{
    assembler::Assembler,
    motion::KinematicState,
    route::{GeodeticPoint, Route},
    train_ctrl::{self, StatusReport, TrainCtrl, TrainCtrlError}
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Destination of the encoded start, stop and trajectory payloads.
pub trait TrajSink {
    fn publish(&mut self, payload: &[u8]) -> Result<(), SimError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Timing of a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Length of one step.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Simulation start time in milliseconds since 2006-01-01T00:00:00Z.
    pub start_time_ms: u64,

    /// Units: seconds
    pub duration_s: f64
}

pub struct Simulator<S: TrajSink> {
    route: Route,
    train_ctrl: TrainCtrl,
    assembler: Assembler,
    sink: S,

    config: SimConfig,

    running: bool,
    num_steps: u64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SimError {
    #[error("TrainCtrl processing failed: {0}")]
    TrainCtrlError(TrainCtrlError),

    #[error("Could not publish to the trajectory socket: {0}")]
    TransportError(TrajSocketError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajSink for TrajSocket {
    fn publish(&mut self, payload: &[u8]) -> Result<(), SimError> {
        self.send_payload(payload)
            .map(|_| ())
            .map_err(SimError::TransportError)
    }
}

impl<S: TrajSink> Simulator<S> {
    pub fn new(
        route: Route,
        train_ctrl: TrainCtrl,
        assembler: Assembler,
        sink: S,
        config: SimConfig
    ) -> Self {
        Self {
            route,
            train_ctrl,
            assembler,
            sink,
            config,
            running: false,
            num_steps: 0
        }
    }

    /// Publish the start command and begin stepping.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.running {
            warn!("Simulation already running, start ignored");
            return Ok(())
        }

        let cmd = self.assembler.start_command(
            &self.route,
            self.train_ctrl.current_state().position_m,
            self.config.start_time_ms,
            (self.config.duration_s * 1000.0).round() as u64
        );

        self.sink.publish(&cmd.to_bytes())?;

        self.assembler.reset();
        self.running = true;

        info!(
            "Simulation started at {} ms for {:.1} s",
            self.config.start_time_ms, self.config.duration_s
        );

        Ok(())
    }

    /// Publish the stop command and stop stepping.
    pub fn stop(&mut self) -> Result<(), SimError> {
        if !self.running {
            debug!("Simulation not running, stop ignored");
            return Ok(())
        }

        self.sink.publish(&StopCommand.to_bytes())?;
        self.running = false;

        info!("Simulation stopped after {} steps", self.num_steps);

        Ok(())
    }

    /// Advance the simulation by one step and publish the records of every user slot.
    ///
    /// The mode and notch commands in `input` are applied even when the simulation isn't
    /// running, in which case `None` is returned. The time step of `input` is ignored in favour
    /// of the configured one.
    pub fn step(
        &mut self, 
        input: &train_ctrl::InputData
    ) -> Result<Option<KinematicState>, SimError> {
        if !self.running {
            if let Some(mode) = input.mode {
                self.train_ctrl.set_mode(mode);
            }
            if let Some(notch) = input.notch {
                self.train_ctrl.set_manual_level(notch);
            }
            return Ok(None)
        }

        let input = train_ctrl::InputData {
            dt_s: self.config.dt_s,
            ..*input
        };

        let (state, _) = self.train_ctrl.proc(&input)
            .map_err(SimError::TrainCtrlError)?;

        let records = self.assembler.build_records(&self.route, &state);
        self.sink.publish(&traj::encode_records(&records))?;

        self.num_steps += 1;

        if self.train_ctrl.is_archiving() {
            if let Err(e) = self.train_ctrl.write() {
                warn!("Could not archive TrainCtrl: {}", e);
            }
        }
        if self.assembler.is_archiving() {
            if let Err(e) = self.assembler.write() {
                warn!("Could not archive trajectory records: {}", e);
            }
        }

        Ok(Some(state))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the configured duration has been simulated.
    pub fn is_finished(&self) -> bool {
        self.train_ctrl.elapsed_s() >= self.config.duration_s
    }

    pub fn num_steps(&self) -> u64 {
        self.num_steps
    }

    pub fn current_state(&self) -> KinematicState {
        self.train_ctrl.current_state()
    }

    /// Along-track speed of the train.
    ///
    /// Units: meters/second
    pub fn speed_ms(&self) -> f64 {
        self.train_ctrl.current_state().velocity_ms
    }

    /// Geodetic position of the head of the train.
    pub fn geodetic_position(&self) -> GeodeticPoint {
        self.route.geodetic_at(self.train_ctrl.current_state().position_m)
    }

    /// Simulation time in milliseconds since 2006-01-01T00:00:00Z.
    pub fn sim_time_ms(&self) -> u64 {
        self.config.start_time_ms + (self.train_ctrl.elapsed_s() * 1000.0).round() as u64
    }

    /// Status report of the last step.
    pub fn report(&self) -> StatusReport {
        self.train_ctrl.report()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn train_ctrl(&self) -> &TrainCtrl {
        &self.train_ctrl
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;
    use comms_if::traj::{StartCommand, TrajectoryRecord};
    use crate::{
        assembler::{Anchor, UserSlot},
        motion::MotionConstraints,
        train_ctrl::{ControlMode, Notch, RunState}
    };

    const DT: f64 = 0.02;

    #[derive(Default)]
    struct MemorySink {
        payloads: Vec<Vec<u8>>
    }

    impl TrajSink for MemorySink {
        fn publish(&mut self, payload: &[u8]) -> Result<(), SimError> {
            self.payloads.push(payload.to_vec());
            Ok(())
        }
    }

    fn sim() -> Simulator<MemorySink> {
        let origin = Vector3::new(6_378_137.0, 0.0, 0.0);
        let route = Route::from_ecef(
            (0..21).map(|k| origin + Vector3::new(0.0, 0.0, 100.0 * k as f64)).collect()
        ).unwrap();

        let c = MotionConstraints::new(20.0, 1.0, -1.0, [0.25, 0.5, 0.5]).unwrap();
        let train_ctrl = TrainCtrl::new(c, route.total_distance_m()).unwrap();

        let assembler = Assembler::new(&[
            UserSlot { traj_id: 1, traj_type: 0, anchor: Anchor::Head },
            UserSlot { traj_id: 2, traj_type: 0, anchor: Anchor::Tail }
        ], 150.0, DT).unwrap();

        Simulator::new(route, train_ctrl, assembler, MemorySink::default(), SimConfig {
            dt_s: DT,
            start_time_ms: 500_000,
            duration_s: 60.0
        })
    }

    #[test]
    fn test_not_running() {
        let mut s = sim();

        assert_eq!(s.step(&Default::default()).unwrap(), None);
        assert!(s.sink().payloads.is_empty());
        assert_eq!(s.num_steps(), 0);

        // Stop without a start publishes nothing
        s.stop().unwrap();
        assert!(s.sink().payloads.is_empty());

        // Commands still reach the controller
        s.step(&train_ctrl::InputData {
            mode: Some(ControlMode::Manual),
            notch: Some(Notch::Traction2),
            ..Default::default()
        }).unwrap();
        assert_eq!(s.train_ctrl().notch(), Some(Notch::Traction2));
    }

    #[test]
    fn test_start_step_stop() {
        let mut s = sim();

        s.start().unwrap();
        assert!(s.is_running());

        let start = StartCommand::parse(&s.sink().payloads[0]).unwrap();
        assert_eq!(start.start_time_ms, 500_000);
        assert_eq!(start.duration_ms, 60_000);
        assert_eq!(start.users[0].traj_id, 1);
        assert!((start.users[0].pos_m[2] - 0.0).abs() < 1e-6);
        assert!((start.users[1].pos_m[2] + 150.0).abs() < 1e-6);

        // A second start is ignored
        s.start().unwrap();
        assert_eq!(s.sink().payloads.len(), 1);

        for _ in 0..50 {
            assert!(s.step(&Default::default()).unwrap().is_some());
        }

        assert_eq!(s.num_steps(), 50);
        assert_eq!(s.sink().payloads.len(), 51);
        assert_eq!(s.sim_time_ms(), 501_000);
        assert_eq!(s.report().run_state, Some(RunState::Accelerating));
        assert!(s.speed_ms() > 0.0);

        let last: Vec<TrajectoryRecord> = traj::decode_records(&s.sink().payloads[50]).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].seq_num, 50);
        assert!((last[0].traj_time_s - 49.0 * DT).abs() < 1e-9);
        assert!((last[0].vel_ms[2] - s.speed_ms()).abs() < 1e-9);

        s.stop().unwrap();
        assert!(!s.is_running());
        assert!(StopCommand::parse(&s.sink().payloads[51]).is_ok());

        assert_eq!(s.step(&Default::default()).unwrap(), None);
        assert_eq!(s.sink().payloads.len(), 52);
    }

    #[test]
    fn test_geodetic_position() {
        let s = sim();
        let p = s.geodetic_position();

        assert!(p.lon_deg.abs() < 1e-9);
        assert!(p.lat_deg.abs() < 1e-9);
        assert!(p.alt_m.abs() < 1e-6);
    }

    #[test]
    fn test_finished() {
        let mut s = sim();
        s.config.duration_s = 1.0;
        s.start().unwrap();

        let mut steps = 0;
        while !s.is_finished() {
            s.step(&Default::default()).unwrap();
            steps += 1;
        }

        assert!(steps == 50 || steps == 51);
    }
}
