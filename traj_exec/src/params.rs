//! # Trajectory Executable Parameters
//!
//! This module provide parameters for the trajectory executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::path::PathBuf;

use crate::{assembler::UserSlot, train_ctrl::ControlMode};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecParams {

    /// Period of one cycle, also the time step of the simulation
    pub cycle_period_ms: u64,

    /// Route file, relative paths are resolved against the software root
    pub route_file: String,

    /// Length of the simulation in seconds
    pub duration_s: f64,

    /// Simulation start time in milliseconds since 2006-01-01T00:00:00Z, the current time if
    /// not set
    #[serde(default)]
    pub start_time_ms: Option<u64>,

    /// Start the simulation without waiting for a start TC
    #[serde(default)]
    pub auto_start: bool,

    #[serde(default)]
    pub initial_mode: ControlMode,

    /// The user slots to publish, one or two
    pub slot: Vec<UserSlot>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ExecParams {
    /// Path to the route file.
    pub fn route_path(&self) -> Result<PathBuf, std::env::VarError> {
        let path = PathBuf::from(&self.route_file);

        if path.is_absolute() {
            Ok(path)
        }
        else {
            Ok(util::host::get_sw_root()?.join(path))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::Anchor;

    #[test]
    fn test_parse_exec_params() {
        let p: ExecParams = util::params::from_str(
            "cycle_period_ms = 20\n\
            route_file = \"/tmp/route.txt\"\n\
            duration_s = 600.0\n\
            auto_start = true\n\
            initial_mode = \"Manual\"\n\
            [[slot]]\n\
            traj_id = 1\n\
            traj_type = 0\n\
            anchor = \"HEAD\"\n"
        ).unwrap();

        assert_eq!(p.cycle_period_ms, 20);
        assert_eq!(p.start_time_ms, None);
        assert_eq!(p.initial_mode, ControlMode::Manual);
        assert_eq!(p.slot.len(), 1);
        assert_eq!(p.slot[0].anchor, Anchor::Head);
        assert_eq!(p.route_path().unwrap(), PathBuf::from("/tmp/route.txt"));
    }
}
