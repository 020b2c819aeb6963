//! Cyclic module interface
//!
//! A cyclic module is set up once from its parameters and then processed once per executive
//! cycle. `traj_exec`'s train control implements this interface, the simulator drives it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Lifecycle of a cyclic module.
///
/// `init` may be called again to restart the module from fresh parameters, `proc` shall return
/// an error rather than panic if it is called before `init`.
pub trait State {
    /// Parameters the module is set up from.
    type InitData;
    type InitError;

    /// Commands and timing for one cycle.
    type InputData;

    /// Main product of one cycle.
    type OutputData;

    /// Diagnostics describing what the module did this cycle.
    type StatusReport;
    type ProcError;

    /// Set the module up, opening any archives inside the session directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
