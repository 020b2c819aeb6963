//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface. Telecommands arrive either as JSON (from scripts) or as
//! whitespace separated words typed on the console.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use structopt::StructOpt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod train_ctrl;

use train_ctrl::{ControlMode, Notch};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the trajectory generator by
/// the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[serde(tag = "type")]
#[structopt(name = "tc")]
pub enum Tc {
    /// Publish the start command and begin stepping the simulation.
    #[structopt(name = "start")]
    Start,

    /// Publish the stop command and stop stepping the simulation.
    #[structopt(name = "stop")]
    Stop,

    /// Switch the train control mode (auto or manual).
    #[structopt(name = "mode")]
    Mode {
        mode: ControlMode
    },

    /// Set the manual notch (idle, cruise, t1..t3, b1..b3).
    #[structopt(name = "notch")]
    Notch {
        notch: Notch
    },

    /// Do nothing, used to check the command path is alive.
    #[structopt(name = "heartbeat")]
    Heartbeat
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC is not a valid console command: {0}")]
    InvalidConsole(String),

    #[error("TC is empty")]
    Empty
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON packet, for example
    /// `{"type": "Notch", "notch": "Brake2"}`.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Parse a new TC from a console line, for example `notch b2`.
    pub fn from_console(line: &str) -> Result<Self, TcParseError> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.is_empty() {
            return Err(TcParseError::Empty)
        }

        Tc::from_iter_safe(std::iter::once("tc").chain(words))
            .map_err(|e| TcParseError::InvalidConsole(e.message))
    }

    /// Serialise this TC to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(Tc::from_json("{\"type\": \"Start\"}").unwrap(), Tc::Start);
        assert_eq!(
            Tc::from_json("{\"type\": \"Mode\", \"mode\": \"Manual\"}").unwrap(),
            Tc::Mode { mode: ControlMode::Manual }
        );
        assert!(matches!(
            Tc::from_json("{\"type\": \"Notch\"}"),
            Err(TcParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_from_console() {
        assert_eq!(Tc::from_console("stop").unwrap(), Tc::Stop);
        assert_eq!(
            Tc::from_console("  notch   b2 ").unwrap(),
            Tc::Notch { notch: Notch::Brake2 }
        );
        assert_eq!(
            Tc::from_console("mode auto").unwrap(),
            Tc::Mode { mode: ControlMode::Automatic }
        );
        assert!(matches!(Tc::from_console(""), Err(TcParseError::Empty)));
        assert!(matches!(
            Tc::from_console("notch b9"),
            Err(TcParseError::InvalidConsole(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let tc = Tc::Notch { notch: Notch::Traction1 };
        let json = tc.to_json().unwrap();
        assert_eq!(Tc::from_json(&json).unwrap(), tc);
    }
}
