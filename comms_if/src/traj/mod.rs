//! # Trajectory wire format
//!
//! Fixed-layout, tight-packed, little-endian records published to the
//! downstream test equipment. Every record implements [`Wire`], which
//! encodes into and decodes from a byte slice of exactly `Wire::LEN` bytes.
//!
//! Layout summary:
//!
//! | Record             | Size (B) |
//! |--------------------|----------|
//! | `FrameHeader`      | 16       |
//! | `TrajectoryRecord` | 248      |
//! | `StartUserParams`  | 200      |
//! | `StartCommand`     | 432      |
//! | `StopCommand`      | 232      |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Magic tag at the start of every frame header.
pub const FRAME_FLAG: u32 = 0xA5A5_6666;

/// Command word of the start command.
pub const START_COMMAND_WORD: u64 = 0x0ABC_0001;

/// Command word of the stop command.
pub const STOP_COMMAND_WORD: u64 = 0x0ABC_0003;

/// Number of user slots carried by the start command.
pub const NUM_START_USERS: usize = 2;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A record with a fixed binary layout.
pub trait Wire: Sized {
    /// Encoded length in bytes.
    const LEN: usize;

    /// Encode into `buf`, which must be exactly `Self::LEN` bytes long.
    fn encode_into(&self, buf: &mut [u8]);

    /// Decode from `buf`, which must be exactly `Self::LEN` bytes long.
    fn decode_from(buf: &[u8]) -> Self;

    /// Encode into a newly allocated buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::LEN];
        self.encode_into(&mut buf);
        buf
    }

    /// Decode from a buffer, checking its length.
    fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() != Self::LEN {
            return Err(WireError::WrongLength {
                expected: Self::LEN,
                found: buf.len()
            })
        }

        Ok(Self::decode_from(buf))
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Header prepended to every datagram.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Per-transport frame counter, wrapping.
    pub frame_number: u32,

    /// Number of payload bytes following the header.
    pub frame_length: u32
}

/// The per-tick trajectory of one user slot.
///
/// Positions and rates are in the ECEF frame. The carrier attitude fields are carried for
/// layout compatibility and are always zero.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub traj_type: u32,
    pub traj_id: u32,
    pub seq_num: u64,
    pub traj_time_s: f64,
    pub pos_m: [f64; 3],
    pub vel_ms: [f64; 3],
    pub acc_mss: [f64; 3],
    pub jerk_msss: [f64; 3],
    pub roll_rad: f64,
    pub azimuth_rad: f64,
    pub pitch_rad: f64,
    pub ang_vel: [f64; 3],
    pub ang_acc: [f64; 3],
    pub ang_jerk: [f64; 3]
}

/// Initial conditions of one user slot in the start command.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartUserParams {
    pub traj_id: u32,
    pub traj_type: u32,
    pub pos_m: [f64; 3],
    pub roll_rad: f64,
    pub azimuth_rad: f64,
    pub pitch_rad: f64
}

/// Command telling the downstream equipment a trajectory is about to start.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCommand {
    /// Simulation start time in milliseconds since 2006-01-01T00:00:00Z.
    pub start_time_ms: u64,

    /// Simulation duration in milliseconds.
    pub duration_ms: u64,

    /// Unused slots are zero-filled.
    pub users: [StartUserParams; NUM_START_USERS]
}

/// Command telling the downstream equipment the trajectory has ended.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StopCommand;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("Expected {expected} bytes but found {found}")]
    WrongLength {
        expected: usize,
        found: usize
    },

    #[error("Invalid frame flag {0:#010x}")]
    InvalidFlag(u32),

    #[error("Invalid command word {0:#x}")]
    InvalidCommandWord(u64),

    #[error("Frame header declares {declared} payload bytes but {found} were received")]
    LengthMismatch {
        declared: usize,
        found: usize
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameHeader {
    /// Check the flag of an encoded header and decode it.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() != Self::LEN {
            return Err(WireError::WrongLength { expected: Self::LEN, found: buf.len() })
        }

        let flag = LittleEndian::read_u32(&buf[0..4]);
        if flag != FRAME_FLAG {
            return Err(WireError::InvalidFlag(flag))
        }

        Ok(Self::decode_from(buf))
    }
}

impl Wire for FrameHeader {
    const LEN: usize = 16;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], FRAME_FLAG);
        LittleEndian::write_u32(&mut buf[4..8], self.frame_number);
        LittleEndian::write_u32(&mut buf[8..12], self.frame_length);
        LittleEndian::write_u32(&mut buf[12..16], 0);
    }

    fn decode_from(buf: &[u8]) -> Self {
        Self {
            frame_number: LittleEndian::read_u32(&buf[4..8]),
            frame_length: LittleEndian::read_u32(&buf[8..12])
        }
    }
}

impl Wire for TrajectoryRecord {
    const LEN: usize = 248;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.traj_type);
        LittleEndian::write_u32(&mut buf[4..8], self.traj_id);
        LittleEndian::write_u64(&mut buf[8..16], self.seq_num);
        LittleEndian::write_u64(&mut buf[16..24], 0);
        LittleEndian::write_f64(&mut buf[24..32], self.traj_time_s);

        let mut kin = [0f64; 12];
        kin[0..3].copy_from_slice(&self.pos_m);
        kin[3..6].copy_from_slice(&self.vel_ms);
        kin[6..9].copy_from_slice(&self.acc_mss);
        kin[9..12].copy_from_slice(&self.jerk_msss);
        LittleEndian::write_f64_into(&kin, &mut buf[32..128]);

        // Reserved
        for b in buf[128..152].iter_mut() {
            *b = 0;
        }

        let mut att = [0f64; 12];
        att[0] = self.roll_rad;
        att[1] = self.azimuth_rad;
        att[2] = self.pitch_rad;
        att[3..6].copy_from_slice(&self.ang_vel);
        att[6..9].copy_from_slice(&self.ang_acc);
        att[9..12].copy_from_slice(&self.ang_jerk);
        LittleEndian::write_f64_into(&att[..], &mut buf[152..248]);
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut kin = [0f64; 12];
        LittleEndian::read_f64_into(&buf[32..128], &mut kin);
        let mut att = [0f64; 12];
        LittleEndian::read_f64_into(&buf[152..248], &mut att);

        Self {
            traj_type: LittleEndian::read_u32(&buf[0..4]),
            traj_id: LittleEndian::read_u32(&buf[4..8]),
            seq_num: LittleEndian::read_u64(&buf[8..16]),
            traj_time_s: LittleEndian::read_f64(&buf[24..32]),
            pos_m: [kin[0], kin[1], kin[2]],
            vel_ms: [kin[3], kin[4], kin[5]],
            acc_mss: [kin[6], kin[7], kin[8]],
            jerk_msss: [kin[9], kin[10], kin[11]],
            roll_rad: att[0],
            azimuth_rad: att[1],
            pitch_rad: att[2],
            ang_vel: [att[3], att[4], att[5]],
            ang_acc: [att[6], att[7], att[8]],
            ang_jerk: [att[9], att[10], att[11]]
        }
    }
}

impl Wire for StartUserParams {
    const LEN: usize = 200;

    fn encode_into(&self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = 0;
        }

        LittleEndian::write_u32(&mut buf[0..4], self.traj_id);
        LittleEndian::write_u32(&mut buf[4..8], self.traj_type);
        LittleEndian::write_f64_into(&self.pos_m, &mut buf[8..32]);
        // 9 reserved doubles
        LittleEndian::write_f64(&mut buf[104..112], self.roll_rad);
        LittleEndian::write_f64(&mut buf[112..120], self.azimuth_rad);
        LittleEndian::write_f64(&mut buf[120..128], self.pitch_rad);
        // 9 reserved doubles
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut pos_m = [0f64; 3];
        LittleEndian::read_f64_into(&buf[8..32], &mut pos_m);

        Self {
            traj_id: LittleEndian::read_u32(&buf[0..4]),
            traj_type: LittleEndian::read_u32(&buf[4..8]),
            pos_m,
            roll_rad: LittleEndian::read_f64(&buf[104..112]),
            azimuth_rad: LittleEndian::read_f64(&buf[112..120]),
            pitch_rad: LittleEndian::read_f64(&buf[120..128])
        }
    }
}

impl StartCommand {
    /// Decode a start command, checking the command word.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let cmd = Self::from_bytes(buf)?;
        let word = LittleEndian::read_u64(&buf[0..8]);
        if word != START_COMMAND_WORD {
            return Err(WireError::InvalidCommandWord(word))
        }
        Ok(cmd)
    }
}

impl Wire for StartCommand {
    const LEN: usize = 32 + NUM_START_USERS * StartUserParams::LEN;

    fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u64(&mut buf[0..8], START_COMMAND_WORD);
        LittleEndian::write_u32(&mut buf[8..12], 0);
        LittleEndian::write_u32(&mut buf[12..16], Self::LEN as u32);
        LittleEndian::write_u64(&mut buf[16..24], self.start_time_ms);
        LittleEndian::write_u64(&mut buf[24..32], self.duration_ms);

        for (i, user) in self.users.iter().enumerate() {
            let start = 32 + i * StartUserParams::LEN;
            user.encode_into(&mut buf[start..start + StartUserParams::LEN]);
        }
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut users = [StartUserParams::default(); NUM_START_USERS];
        for (i, user) in users.iter_mut().enumerate() {
            let start = 32 + i * StartUserParams::LEN;
            *user = StartUserParams::decode_from(&buf[start..start + StartUserParams::LEN]);
        }

        Self {
            start_time_ms: LittleEndian::read_u64(&buf[16..24]),
            duration_ms: LittleEndian::read_u64(&buf[24..32]),
            users
        }
    }
}

impl StopCommand {
    /// Decode a stop command, checking the command word.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let cmd = Self::from_bytes(buf)?;
        let word = LittleEndian::read_u64(&buf[0..8]);
        if word != STOP_COMMAND_WORD {
            return Err(WireError::InvalidCommandWord(word))
        }
        Ok(cmd)
    }
}

impl Wire for StopCommand {
    const LEN: usize = 232;

    fn encode_into(&self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = 0;
        }

        LittleEndian::write_u64(&mut buf[0..8], STOP_COMMAND_WORD);
        LittleEndian::write_u32(&mut buf[8..12], Self::LEN as u32);
    }

    fn decode_from(_buf: &[u8]) -> Self {
        StopCommand
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Concatenate the records of all active slots into one payload.
pub fn encode_records(records: &[TrajectoryRecord]) -> Vec<u8> {
    let mut payload = vec![0u8; records.len() * TrajectoryRecord::LEN];

    for (chunk, record) in payload.chunks_exact_mut(TrajectoryRecord::LEN).zip(records) {
        record.encode_into(chunk);
    }

    payload
}

/// Split a payload back into trajectory records.
pub fn decode_records(payload: &[u8]) -> Result<Vec<TrajectoryRecord>, WireError> {
    if payload.len() % TrajectoryRecord::LEN != 0 {
        return Err(WireError::WrongLength {
            expected: (payload.len() / TrajectoryRecord::LEN + 1) * TrajectoryRecord::LEN,
            found: payload.len()
        })
    }

    Ok(payload.chunks_exact(TrajectoryRecord::LEN)
        .map(TrajectoryRecord::decode_from)
        .collect())
}

/// Prefix a payload with its frame header.
pub fn frame(frame_number: u32, payload: &[u8]) -> Vec<u8> {
    let header = FrameHeader {
        frame_number,
        frame_length: payload.len() as u32
    };

    let mut buf = Vec::with_capacity(FrameHeader::LEN + payload.len());
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Split a framed datagram into its header and payload.
pub fn unframe(datagram: &[u8]) -> Result<(FrameHeader, &[u8]), WireError> {
    if datagram.len() < FrameHeader::LEN {
        return Err(WireError::WrongLength {
            expected: FrameHeader::LEN,
            found: datagram.len()
        })
    }

    let header = FrameHeader::parse(&datagram[..FrameHeader::LEN])?;
    let payload = &datagram[FrameHeader::LEN..];

    if header.frame_length as usize != payload.len() {
        return Err(WireError::LengthMismatch {
            declared: header.frame_length as usize,
            found: payload.len()
        })
    }

    Ok((header, payload))
}
