//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use comms_if::tc::Tc;
use traj_lib::data_store::DataStore;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {

    // Handle different Tcs
    match tc {
        Tc::Start => {
            debug!("Recieved Start command");
            ds.start_requested = true;
        },
        Tc::Stop => {
            debug!("Recieved Stop command");
            ds.stop_requested = true;
        },
        Tc::Mode { mode } => {
            ds.train_ctrl_input.mode = Some(*mode)
        },
        Tc::Notch { notch } => {
            ds.train_ctrl_input.notch = Some(*notch)
        },
        Tc::Heartbeat => {
            debug!("Recieved Heartbeat")
        }
    }

}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::train_ctrl::{ControlMode, Notch};

    #[test]
    fn test_exec() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Tc::Mode { mode: ControlMode::Manual });
        exec(&mut ds, &Tc::Notch { notch: Notch::Brake2 });
        exec(&mut ds, &Tc::Heartbeat);

        assert_eq!(ds.train_ctrl_input.mode, Some(ControlMode::Manual));
        assert_eq!(ds.train_ctrl_input.notch, Some(Notch::Brake2));
        assert!(!ds.start_requested && !ds.stop_requested);

        exec(&mut ds, &Tc::Start);
        exec(&mut ds, &Tc::Stop);
        assert!(ds.start_requested && ds.stop_requested);
    }
}
