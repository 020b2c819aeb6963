//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::train_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Executive time, the number of cycles multiplied by the cycle period. Scripts are replayed
    /// against this time.
    pub exec_time_s: f64,

    // Control plane
    /// A start TC was received this cycle
    pub start_requested: bool,

    /// A stop TC was received this cycle
    pub stop_requested: bool,

    // TrainCtrl
    pub train_ctrl_input: train_ctrl::InputData,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: u64, cycle_period_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % cycle_frequency_hz.max(1) == 0;

        self.start_requested = false;
        self.stop_requested = false;
        self.train_ctrl_input = train_ctrl::InputData::default();

        self.exec_time_s = self.num_cycles as f64 * cycle_period_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::train_ctrl::Notch;

    #[test]
    fn test_cycle_start() {
        let mut ds = DataStore::default();

        ds.cycle_start(10, 0.1);
        assert!(ds.is_1_hz_cycle);
        ds.stop_requested = true;
        ds.train_ctrl_input.notch = Some(Notch::Brake1);
        ds.cycle_end();

        ds.cycle_start(10, 0.1);
        assert!(!ds.is_1_hz_cycle);
        assert!(!ds.stop_requested);
        assert_eq!(ds.train_ctrl_input.notch, None);
        assert!((ds.exec_time_s - 0.1).abs() < 1e-12);

        for _ in 0..9 {
            ds.cycle_end();
        }
        ds.cycle_start(10, 0.1);
        assert!(ds.is_1_hz_cycle);
    }
}
