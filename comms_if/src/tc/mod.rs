//! # Telecommand module
//!
//! Telecommands are instructions sent to the control core by the operator interface, a manual
//! teleop device, or a TC script. They only ever write the operator-owned fields of the state bus.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand.
///
/// Serialised as `{"type": "<TYPE>", "payload": <payload>}`, for example
/// `{"type": "MODE", "payload": "zone"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// Select the top-level mode.
    #[serde(rename = "MODE")]
    SetMode(Mode),

    /// Body-frame velocity to pass straight through while in manual mode.
    #[serde(rename = "MANUAL")]
    Manual {
        lateral: f64,
        forward: f64,
        angular: f64,
    },

    /// Start, check or finish colour calibration. While calibrating the robot is frozen.
    #[serde(rename = "CALIBRATE")]
    Calibrate {
        status: CalibrationStatus,
        colour: String,
    },

    /// Force the light on or off, or `null` to return it to automatic control.
    #[serde(rename = "LIGHT")]
    LightOverride(Option<bool>),

    /// Stop the whole process group.
    #[serde(rename = "TERMINATE")]
    Terminate,
}

/// Top-level operating mode of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Motion is taken verbatim from the manual teleop fields.
    Manual,

    /// Follow the line and handle intersections.
    FollowLine,

    /// Search for and rescue victims in the evacuation zone.
    Zone,
}

/// State of the colour calibration procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    None,
    Calibrate,
    Check,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON or an unknown type: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::FollowLine
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::FollowLine => write!(f, "follow_line"),
            Mode::Zone => write!(f, "zone"),
        }
    }
}

impl Default for CalibrationStatus {
    fn default() -> Self {
        CalibrationStatus::None
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcs() {
        assert_eq!(
            Tc::from_json(r#"{"type": "MODE", "payload": "zone"}"#).unwrap(),
            Tc::SetMode(Mode::Zone)
        );
        assert_eq!(
            Tc::from_json(
                r#"{"type": "MANUAL", "payload": {"lateral": 0.0, "forward": 0.5, "angular": -0.1}}"#
            )
            .unwrap(),
            Tc::Manual {
                lateral: 0.0,
                forward: 0.5,
                angular: -0.1
            }
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "LIGHT", "payload": null}"#).unwrap(),
            Tc::LightOverride(None)
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "TERMINATE"}"#).unwrap(),
            Tc::Terminate
        );
    }

    #[test]
    fn test_reject_unknown_type() {
        assert!(Tc::from_json(r#"{"type": "WARP", "payload": 9}"#).is_err());
        assert!(Tc::from_json("not json").is_err());
    }

    #[test]
    fn test_json_is_reversible() {
        let tc = Tc::Calibrate {
            status: CalibrationStatus::Check,
            colour: String::from("z-g"),
        };
        let json = tc.to_json().unwrap();
        assert_eq!(Tc::from_json(&json).unwrap(), tc);
    }
}
