//! Implementations for the TrainCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::motion::{KinematicState, MotionConstraints, MotionPlanner};
use util::{
    module::State,
    archive::{Archived, Archiver, ArchiveError},
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Train control module state
#[derive(Default)]
pub struct TrainCtrl {
    /// `None` until the module is initialised.
    planner: Option<MotionPlanner>,

    state: KinematicState,

    control: Control,

    station_position_m: f64,

    elapsed_s: f64,

    report: StatusReport,
    arch_state: Archiver
}

/// Data required to initialise TrainCtrl.
#[derive(Debug, Clone)]
pub struct InitData {
    pub vehicle: VehicleParams,

    /// Arc length of the stopping point.
    pub station_position_m: f64
}

/// Input data to TrainCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Length of this cycle in seconds.
    pub dt_s: f64,

    /// A new control mode, or `None` to keep the current one.
    pub mode: Option<ControlMode>,

    /// A new manual notch, or `None` to keep the current one.
    pub notch: Option<Notch>
}

/// Status report for TrainCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub mode: ControlMode,
    pub run_state: Option<RunState>,
    pub notch: Option<Notch>,

    /// The stopped train was snapped back onto the station this cycle.
    pub snapped: bool,

    /// A braking notch was ignored because the train is at a standstill.
    pub anti_reverse: bool,

    pub dist_to_station_m: f64
}

/// One row of the kinematic state archive.
#[derive(Serialize)]
struct ArchRow {
    sim_time_s: f64,
    mode: ControlMode,
    run_state: Option<RunState>,
    notch: Option<Notch>,
    position_m: f64,
    velocity_ms: f64,
    accel_mss: f64,
    jerk_msss: f64,
    dist_to_station_m: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of an automatic station-to-station run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Stopped,
    Accelerating,
    Cruising,
    Coasting,

    /// Declared for completeness, no transition enters it.
    Braking
}

/// The active control mode together with the data only that mode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Automatic {
        run_state: RunState
    },
    Manual {
        notch: Notch
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Control {
    fn default() -> Self {
        Control::Automatic {
            run_state: RunState::Stopped
        }
    }
}

impl Control {
    pub fn mode(&self) -> ControlMode {
        match self {
            Control::Automatic { .. } => ControlMode::Automatic,
            Control::Manual { .. } => ControlMode::Manual
        }
    }
}

impl State for TrainCtrl {
    type InitData = InitData;
    type InitError = TrainCtrlError;
    
    type InputData = InputData;
    type OutputData = KinematicState;
    type StatusReport = StatusReport;
    type ProcError = TrainCtrlError;

    /// Initialise the TrainCtrl module.
    ///
    /// The train starts at rest at the beginning of the route in automatic mode.
    fn init(&mut self, init_data: Self::InitData, session: &Session) 
        -> Result<(), Self::InitError> 
    {
        let constraints = MotionConstraints::from_vehicle(&init_data.vehicle)
            .map_err(TrainCtrlError::InvalidVehicle)?;

        *self = Self::new(constraints, init_data.station_position_m)?;

        self.arch_state = Archiver::from_path(
            session, "train_ctrl/kinematic_state.csv"
        ).map_err(TrainCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of TrainCtrl.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        if let Some(mode) = input_data.mode {
            self.set_mode(mode);
        }
        if let Some(notch) = input_data.notch {
            self.set_manual_level(notch);
        }

        let output = self.tick(input_data.dt_s)?;

        Ok((output, self.report))
    }
}

impl Archived for TrainCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let row = ArchRow {
            sim_time_s: self.elapsed_s,
            mode: self.report.mode,
            run_state: self.report.run_state,
            notch: self.report.notch,
            position_m: self.state.position_m,
            velocity_ms: self.state.velocity_ms,
            accel_mss: self.state.accel_mss,
            jerk_msss: self.state.jerk_msss,
            dist_to_station_m: self.report.dist_to_station_m
        };

        self.arch_state.serialise(row)
    }
}

impl TrainCtrl {
    /// Create a new controller at rest at the start of the route, in automatic mode.
    pub fn new(
        constraints: MotionConstraints, 
        station_position_m: f64
    ) -> Result<Self, TrainCtrlError> {
        if !station_position_m.is_finite() {
            return Err(TrainCtrlError::InvalidStation(station_position_m))
        }

        Ok(Self {
            planner: Some(MotionPlanner::new(constraints)),
            station_position_m,
            ..Default::default()
        })
    }

    /// Switch the control mode.
    ///
    /// Entering automatic mode always restarts the run state machine from `Stopped` with a zero
    /// velocity target. Entering manual mode starts at the `Idle` notch, requesting manual mode
    /// while already in it keeps the current notch.
    pub fn set_mode(&mut self, mode: ControlMode) {
        match mode {
            ControlMode::Automatic => {
                self.control = Control::Automatic { run_state: RunState::Stopped };
                if let Some(p) = self.planner.as_mut() {
                    p.set_target_velocity(0.0);
                }
                info!("TrainCtrl mode set to {}", mode);
            },
            ControlMode::Manual => {
                if let Control::Automatic { .. } = self.control {
                    self.control = Control::Manual { notch: Notch::Idle };
                    info!("TrainCtrl mode set to {}", mode);
                }
            }
        }
    }

    /// Set the manual notch. Ignored with a warning outside of manual mode.
    pub fn set_manual_level(&mut self, level: Notch) {
        match self.control {
            Control::Manual { ref mut notch } => {
                if *notch != level {
                    info!("TrainCtrl notch {} -> {}", notch, level);
                }
                *notch = level;
            },
            Control::Automatic { .. } => {
                warn!("Notch {} ignored, TrainCtrl is not in manual mode", level);
            }
        }
    }

    /// Advance the controller by one cycle of `dt_s` seconds.
    pub fn tick(&mut self, dt_s: f64) -> Result<KinematicState, TrainCtrlError> {
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return Err(TrainCtrlError::InvalidTimeStep(dt_s))
        }

        let planner = match self.planner.as_mut() {
            Some(p) => p,
            None => return Err(TrainCtrlError::NotInitialised)
        };
        let constraints = *planner.constraints();

        self.report = StatusReport::default();

        match self.control {
            Control::Automatic { ref mut run_state } => {
                let dist_m = self.station_position_m - self.state.position_m;
                let velocity_ms = self.state.velocity_ms;
                let max_velocity_ms = constraints.max_velocity_ms();

                let next = match *run_state {
                    RunState::Stopped => {
                        planner.set_target_velocity(max_velocity_ms);
                        RunState::Accelerating
                    },
                    RunState::Accelerating 
                        if (velocity_ms - max_velocity_ms).abs() < CRUISE_VELOCITY_TOL_MS 
                        => RunState::Cruising,
                    RunState::Cruising if dist_m < COASTING_BUFFER_M => {
                        planner.set_target_velocity(0.0);
                        RunState::Coasting
                    },
                    RunState::Coasting 
                        if velocity_ms < STOPPED_VELOCITY_MS && dist_m < STOPPED_DISTANCE_M 
                        => RunState::Stopped,
                    s => s
                };

                if next != *run_state {
                    info!(
                        "Run state {:?} -> {:?} at {:.2} m ({:.2} m to station), {:.3} m/s",
                        run_state, next, self.state.position_m, dist_m, velocity_ms
                    );
                    *run_state = next;
                }

                planner.advance_by_velocity(dt_s, &mut self.state);

                if *run_state == RunState::Stopped 
                    && self.state.position_m > self.station_position_m + SNAP_TOLERANCE_M 
                {
                    info!(
                        "Stopped {:.3} m past the station, snapping onto it",
                        self.state.position_m - self.station_position_m
                    );
                    self.state = KinematicState::at_rest(self.station_position_m);
                    self.report.snapped = true;
                }
            },
            Control::Manual { notch } => {
                let fraction = notch.fraction();
                let mut target_mss = if fraction >= 0.0 {
                    fraction * constraints.max_accel_mss()
                }
                else {
                    -fraction * constraints.min_accel_mss()
                };

                if self.state.velocity_ms <= STANDSTILL_VELOCITY_MS && target_mss < 0.0 {
                    target_mss = 0.0;
                    self.report.anti_reverse = true;
                }

                planner.set_target_acceleration(target_mss);
                planner.advance_by_acceleration(dt_s, &mut self.state);
            }
        }

        self.elapsed_s += dt_s;

        self.report.mode = self.control.mode();
        self.report.run_state = self.run_state();
        self.report.notch = self.notch();
        self.report.dist_to_station_m = self.distance_to_station_m();

        trace!("TrainCtrl state: {:?}", self.state);

        Ok(self.state)
    }

    /// The current kinematic state.
    pub fn current_state(&self) -> KinematicState {
        self.state
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn mode(&self) -> ControlMode {
        self.control.mode()
    }

    /// The automatic run state, `None` in manual mode.
    pub fn run_state(&self) -> Option<RunState> {
        match self.control {
            Control::Automatic { run_state } => Some(run_state),
            Control::Manual { .. } => None
        }
    }

    /// The manual notch, `None` in automatic mode.
    pub fn notch(&self) -> Option<Notch> {
        match self.control {
            Control::Manual { notch } => Some(notch),
            Control::Automatic { .. } => None
        }
    }

    pub fn station_position_m(&self) -> f64 {
        self.station_position_m
    }

    /// Remaining distance to the stopping point, negative once past it.
    pub fn distance_to_station_m(&self) -> f64 {
        self.station_position_m - self.state.position_m
    }

    pub fn constraints(&self) -> Option<&MotionConstraints> {
        self.planner.as_ref().map(|p| p.constraints())
    }

    /// The status report of the last cycle.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Total time the controller has been ticked for.
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Whether `write` has an archive file to write to.
    pub fn is_archiving(&self) -> bool {
        self.arch_state.is_open()
    }
}
