//! # Trajectory assembler
//!
//! Turns the longitudinal state of the train into one `TrajectoryRecord` per user slot each
//! cycle. A slot is anchored either at the head of the train, which follows the kinematic
//! position, or at its tail, which trails it by the vehicle length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use thiserror::Error;

// Internal
use comms_if::traj::{StartCommand, StartUserParams, TrajectoryRecord, NUM_START_USERS};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    session::Session
};
use crate::{motion::KinematicState, route::Route};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of a single user slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSlot {
    /// Trajectory identifier written into every record of this slot.
    pub traj_id: u32,

    /// Trajectory type tag written into every record of this slot.
    pub traj_type: u32,

    pub anchor: Anchor
}

/// Builds the per-cycle records of every user slot.
#[derive(Default)]
pub struct Assembler {
    slots: Vec<UserSlot>,

    /// Sequence number of the last record built for each slot
    seq_nums: Vec<u64>,

    vehicle_length_m: f64,

    dt_s: f64,

    last_records: Vec<TrajectoryRecord>,

    arch_records: Archiver
}

/// One row of the record archive.
#[derive(Serialize)]
struct ArchRow {
    traj_id: u32,
    seq_num: u64,
    traj_time_s: f64,
    pos_x_m: f64,
    pos_y_m: f64,
    pos_z_m: f64,
    vel_x_ms: f64,
    vel_y_ms: f64,
    vel_z_ms: f64,
    acc_x_mss: f64,
    acc_y_mss: f64,
    acc_z_mss: f64,
    jerk_x_msss: f64,
    jerk_y_msss: f64,
    jerk_z_msss: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The point of the train a user slot follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Anchor {
    Head,
    Tail
}

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Between 1 and 2 user slots are required, found {0}")]
    InvalidNumSlots(usize),

    #[error("Time step must be finite and positive, found {0}")]
    InvalidTimeStep(f64),

    #[error("Vehicle length must be finite and non-negative, found {0}")]
    InvalidVehicleLength(f64),

    #[error("Could not open the record archive: {0}")]
    ArchiveError(ArchiveError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Assembler {
    /// Create a new assembler for the given slots, sampled every `dt_s` seconds.
    pub fn new(
        slots: &[UserSlot], 
        vehicle_length_m: f64, 
        dt_s: f64
    ) -> Result<Self, AssemblerError> {
        if slots.is_empty() || slots.len() > NUM_START_USERS {
            return Err(AssemblerError::InvalidNumSlots(slots.len()))
        }
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return Err(AssemblerError::InvalidTimeStep(dt_s))
        }
        if !vehicle_length_m.is_finite() || vehicle_length_m < 0.0 {
            return Err(AssemblerError::InvalidVehicleLength(vehicle_length_m))
        }

        Ok(Self {
            slots: slots.to_vec(),
            seq_nums: vec![0; slots.len()],
            vehicle_length_m,
            dt_s,
            ..Default::default()
        })
    }

    /// Open the record archive in the session's archive directory.
    pub fn open_archive(&mut self, session: &Session) -> Result<(), AssemblerError> {
        self.arch_records = Archiver::from_path(session, "traj/records.csv")
            .map_err(AssemblerError::ArchiveError)?;
        Ok(())
    }

    pub fn slots(&self) -> &[UserSlot] {
        &self.slots
    }

    /// Sequence number of the last record built for each slot.
    pub fn seq_nums(&self) -> &[u64] {
        &self.seq_nums
    }

    /// Whether `write` has an archive file to write to.
    pub fn is_archiving(&self) -> bool {
        self.arch_records.is_open()
    }

    /// The records built in the last call to `build_records`.
    pub fn last_records(&self) -> &[TrajectoryRecord] {
        &self.last_records
    }

    /// Restart every slot's sequence from 1.
    pub fn reset(&mut self) {
        self.seq_nums.iter_mut().for_each(|s| *s = 0);
        self.last_records.clear();
    }

    /// Arc length sampled by a slot when the head of the train is at `position_m`.
    pub fn anchor_position_m(&self, anchor: Anchor, position_m: f64) -> f64 {
        match anchor {
            Anchor::Head => position_m,
            Anchor::Tail => position_m - self.vehicle_length_m
        }
    }

    /// Build the records of every slot for the given state.
    pub fn build_records(
        &mut self, 
        route: &Route, 
        state: &KinematicState
    ) -> Vec<TrajectoryRecord> {
        let mut records = Vec::with_capacity(self.slots.len());

        for i in 0..self.slots.len() {
            let slot = self.slots[i];
            self.seq_nums[i] += 1;
            let seq_num = self.seq_nums[i];

            let s_m = self.anchor_position_m(slot.anchor, state.position_m);
            let v = state.velocity_ms;
            let a = state.accel_mss;

            records.push(TrajectoryRecord {
                traj_type: slot.traj_type,
                traj_id: slot.traj_id,
                seq_num,
                traj_time_s: (seq_num - 1) as f64 * self.dt_s,
                pos_m: to_array(route.position_at(s_m)),
                vel_ms: to_array(route.velocity_at(s_m, v)),
                acc_mss: to_array(route.acceleration_at(s_m, v, a)),
                jerk_msss: to_array(route.jerk_at(s_m, v, a, state.jerk_msss)),
                ..Default::default()
            });
        }

        self.last_records = records.clone();

        records
    }

    /// Build the start command with each slot's initial position for a train whose head is at
    /// `position_m`.
    pub fn start_command(
        &self, 
        route: &Route, 
        position_m: f64, 
        start_time_ms: u64, 
        duration_ms: u64
    ) -> StartCommand {
        let mut users = [StartUserParams::default(); NUM_START_USERS];

        for (user, slot) in users.iter_mut().zip(self.slots.iter()) {
            let s_m = self.anchor_position_m(slot.anchor, position_m);
            *user = StartUserParams {
                traj_id: slot.traj_id,
                traj_type: slot.traj_type,
                pos_m: to_array(route.position_at(s_m)),
                ..Default::default()
            };
        }

        StartCommand {
            start_time_ms,
            duration_ms,
            users
        }
    }
}

impl Archived for Assembler {
    fn write(&mut self) -> Result<(), ArchiveError> {
        for r in self.last_records.iter() {
            self.arch_records.serialise(ArchRow {
                traj_id: r.traj_id,
                seq_num: r.seq_num,
                traj_time_s: r.traj_time_s,
                pos_x_m: r.pos_m[0],
                pos_y_m: r.pos_m[1],
                pos_z_m: r.pos_m[2],
                vel_x_ms: r.vel_ms[0],
                vel_y_ms: r.vel_ms[1],
                vel_z_ms: r.vel_ms[2],
                acc_x_mss: r.acc_mss[0],
                acc_y_mss: r.acc_mss[1],
                acc_z_mss: r.acc_mss[2],
                jerk_x_msss: r.jerk_msss[0],
                jerk_y_msss: r.jerk_msss[1],
                jerk_z_msss: r.jerk_msss[2]
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn to_array(v: Vector3<f64>) -> [f64; 3] {
    [v[0], v[1], v[2]]
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.02;

    fn head_tail() -> [UserSlot; 2] {
        [
            UserSlot { traj_id: 1, traj_type: 1, anchor: Anchor::Head },
            UserSlot { traj_id: 2, traj_type: 1, anchor: Anchor::Tail }
        ]
    }

    /// A straight route along ECEF X, 1 km long.
    fn x_route() -> Route {
        let origin = Vector3::new(6_378_137.0, 0.0, 0.0);
        let points = (0..11)
            .map(|k| origin + Vector3::new(100.0 * k as f64, 0.0, 0.0))
            .collect();
        Route::from_ecef(points).unwrap()
    }

    fn moving(position_m: f64) -> KinematicState {
        KinematicState {
            position_m,
            velocity_ms: 10.0,
            accel_mss: 0.5,
            jerk_msss: -0.25
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Assembler::new(&[], 10.0, DT), 
            Err(AssemblerError::InvalidNumSlots(0))
        ));
        let three = [head_tail()[0]; 3];
        assert!(matches!(
            Assembler::new(&three, 10.0, DT), 
            Err(AssemblerError::InvalidNumSlots(3))
        ));
        assert!(matches!(
            Assembler::new(&head_tail(), 10.0, 0.0), 
            Err(AssemblerError::InvalidTimeStep(_))
        ));
        assert!(matches!(
            Assembler::new(&head_tail(), -1.0, DT), 
            Err(AssemblerError::InvalidVehicleLength(_))
        ));
    }

    #[test]
    fn test_sequence_and_time() {
        let route = x_route();
        let mut asm = Assembler::new(&head_tail(), 100.0, DT).unwrap();

        let first = asm.build_records(&route, &moving(300.0));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].seq_num, 1);
        assert_eq!(first[1].seq_num, 1);
        assert_eq!(first[0].traj_time_s, 0.0);

        let mut last = first;
        for _ in 0..4 {
            last = asm.build_records(&route, &moving(300.0));
        }
        assert_eq!(last[0].seq_num, 5);
        assert!((last[1].traj_time_s - 4.0 * DT).abs() < 1e-12);
        assert_eq!(asm.seq_nums(), &[5, 5]);

        asm.reset();
        assert_eq!(asm.build_records(&route, &moving(300.0))[0].seq_num, 1);
    }

    #[test]
    fn test_head_and_tail() {
        let route = x_route();
        let mut asm = Assembler::new(&head_tail(), 120.0, DT).unwrap();
        let records = asm.build_records(&route, &moving(500.0));

        let head = &records[0];
        let tail = &records[1];

        assert_eq!(head.traj_id, 1);
        assert_eq!(tail.traj_id, 2);
        assert!((head.pos_m[0] - (6_378_137.0 + 500.0)).abs() < 1e-6);
        assert!((tail.pos_m[0] - (6_378_137.0 + 380.0)).abs() < 1e-6);
        assert_eq!(
            tail.pos_m, 
            to_array(route.position_at(asm.anchor_position_m(Anchor::Tail, 500.0)))
        );

        // Rates are identical along a straight track
        for i in 0..3 {
            assert!((head.vel_ms[i] - tail.vel_ms[i]).abs() < 1e-9);
            assert!((head.acc_mss[i] - tail.acc_mss[i]).abs() < 1e-9);
            assert!((head.jerk_msss[i] - tail.jerk_msss[i]).abs() < 1e-9);
        }
        assert!((head.vel_ms[0] - 10.0).abs() < 1e-9);
        assert!((head.acc_mss[0] - 0.5).abs() < 1e-9);
        assert!((head.jerk_msss[0] + 0.25).abs() < 1e-9);

        // Attitude is not simulated
        assert_eq!(head.roll_rad, 0.0);
        assert_eq!(head.ang_vel, [0.0; 3]);
    }

    #[test]
    fn test_start_command() {
        let route = x_route();
        let single = [UserSlot { traj_id: 7, traj_type: 3, anchor: Anchor::Head }];
        let asm = Assembler::new(&single, 50.0, DT).unwrap();

        let cmd = asm.start_command(&route, 0.0, 1_000, 60_000);

        assert_eq!(cmd.start_time_ms, 1_000);
        assert_eq!(cmd.duration_ms, 60_000);
        assert_eq!(cmd.users[0].traj_id, 7);
        assert_eq!(cmd.users[0].traj_type, 3);
        assert!((cmd.users[0].pos_m[0] - 6_378_137.0).abs() < 1e-6);
        assert_eq!(cmd.users[1], StartUserParams::default());
    }

    #[test]
    fn test_archive() {
        let root = std::env::temp_dir().join("railtraj_assembler_test");
        let session = Session::in_dir("asm", &root).unwrap();

        let route = x_route();
        let mut asm = Assembler::new(&head_tail(), 100.0, DT).unwrap();
        asm.open_archive(&session).unwrap();

        asm.build_records(&route, &moving(200.0));
        asm.write().unwrap();
        asm.build_records(&route, &moving(200.2));
        asm.write().unwrap();

        let text = std::fs::read_to_string(session.arch_root.join("traj/records.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("traj_id,seq_num,traj_time_s,pos_x_m"));
        assert!(lines[3].starts_with("1,2,"));
    }

    #[test]
    fn test_slot_config() {
        #[derive(Deserialize)]
        struct Slots {
            slot: Vec<UserSlot>
        }

        let s: Slots = util::params::from_str(
            "[[slot]]\ntraj_id = 1\ntraj_type = 0\nanchor = \"HEAD\"\n\
            [[slot]]\ntraj_id = 2\ntraj_type = 0\nanchor = \"TAIL\"\n"
        ).unwrap();

        assert_eq!(s.slot[1].anchor, Anchor::Tail);
    }
}
