//! # Train control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The control mode of the train.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Station-to-station driving, the run state machine picks the target velocity.
    Automatic,

    /// Notch driving, the operator picks the target acceleration.
    Manual
}

/// A discrete manual control level.
///
/// Traction notches command a fraction of the maximum traction acceleration, brake notches the
/// same fraction of the (negative) braking acceleration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notch {
    Idle,
    Cruise,
    Traction1,
    Traction2,
    Traction3,
    Brake1,
    Brake2,
    Brake3
}

#[derive(Debug, Error, PartialEq)]
#[error("Unrecognised {kind}: \"{value}\"")]
pub struct ParseCtrlError {
    kind: &'static str,
    value: String
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::Automatic
    }
}

impl Default for Notch {
    fn default() -> Self {
        Notch::Idle
    }
}

impl Notch {
    /// The signed fraction of the acceleration envelope this notch commands.
    ///
    /// Positive fractions apply to the maximum acceleration, negative ones to the magnitude of
    /// the minimum acceleration.
    pub fn fraction(&self) -> f64 {
        match self {
            Notch::Idle | Notch::Cruise => 0.0,
            Notch::Traction1 => 1.0 / 3.0,
            Notch::Traction2 => 2.0 / 3.0,
            Notch::Traction3 => 1.0,
            Notch::Brake1 => -1.0 / 3.0,
            Notch::Brake2 => -2.0 / 3.0,
            Notch::Brake3 => -1.0,
        }
    }
}

impl FromStr for ControlMode {
    type Err = ParseCtrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "automatic" => Ok(ControlMode::Automatic),
            "manual" => Ok(ControlMode::Manual),
            _ => Err(ParseCtrlError { kind: "control mode", value: s.into() })
        }
    }
}

impl FromStr for Notch {
    type Err = ParseCtrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "idle" => Ok(Notch::Idle),
            "cruise" => Ok(Notch::Cruise),
            "t1" | "traction1" => Ok(Notch::Traction1),
            "t2" | "traction2" => Ok(Notch::Traction2),
            "t3" | "traction3" => Ok(Notch::Traction3),
            "b1" | "brake1" => Ok(Notch::Brake1),
            "b2" | "brake2" => Ok(Notch::Brake2),
            "b3" | "brake3" => Ok(Notch::Brake3),
            _ => Err(ParseCtrlError { kind: "notch", value: s.into() })
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Automatic => write!(f, "AUTOMATIC"),
            ControlMode::Manual => write!(f, "MANUAL")
        }
    }
}

impl fmt::Display for Notch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Notch::Idle => "IDLE",
            Notch::Cruise => "CRUISE",
            Notch::Traction1 => "TRACTION_1",
            Notch::Traction2 => "TRACTION_2",
            Notch::Traction3 => "TRACTION_3",
            Notch::Brake1 => "BRAKE_1",
            Notch::Brake2 => "BRAKE_2",
            Notch::Brake3 => "BRAKE_3",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_notch() {
        assert_eq!("b3".parse::<Notch>(), Ok(Notch::Brake3));
        assert_eq!("Traction2".parse::<Notch>(), Ok(Notch::Traction2));
        assert_eq!("IDLE".parse::<Notch>(), Ok(Notch::Idle));
        assert!("t4".parse::<Notch>().is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("auto".parse::<ControlMode>(), Ok(ControlMode::Automatic));
        assert_eq!("Manual".parse::<ControlMode>(), Ok(ControlMode::Manual));
        assert!("cruise".parse::<ControlMode>().is_err());
    }

    #[test]
    fn test_notch_fractions() {
        assert_eq!(Notch::Idle.fraction(), 0.0);
        assert_eq!(Notch::Cruise.fraction(), 0.0);
        assert_eq!(Notch::Traction3.fraction(), 1.0);
        assert_eq!(Notch::Brake3.fraction(), -1.0);
        assert!((Notch::Brake1.fraction() + 1.0 / 3.0).abs() < 1e-12);
    }
}
