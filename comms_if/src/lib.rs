//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the trajectory
//! generator: telecommands, the trajectory wire format and the datagram
//! transport used to publish it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Binary trajectory wire format
pub mod traj;

/// Network module
pub mod net;
