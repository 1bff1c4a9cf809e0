//! # Motor/Sensor Microcontroller Interface
//!
//! Logical command and telemetry vocabulary exchanged with the microcontroller that drives the
//! wheels, light and servos and reads the IMU and proximity sensors. The byte framing on the wire
//! belongs to the transport, not to this module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of independently driven wheels.
pub const NUM_WHEELS: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Orientation reported by the IMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Units: degrees, positive is anticlockwise seen from above
    pub yaw_deg: f64,

    /// Units: degrees, positive is nose up
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,
}

/// Raw proximity readings. Larger values mean a closer obstacle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proximity {
    pub front_left: i32,
    pub front_right: i32,
    pub rear: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands sent to the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McuCmd {
    /// Signed wheel speeds in front-left, front-right, back-left, back-right order.
    Motors([i32; NUM_WHEELS]),

    /// Switch the line illumination on or off.
    Light(bool),

    /// Execute one of the servo presets stored on the microcontroller.
    ServoPreset(u8),

    /// Stop all actuators. Sent once at shutdown.
    Stop,
}

/// Telemetry received from the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum McuTelem {
    Orientation(Orientation),

    FrontProximity { left: i32, right: i32 },

    RearProximity(i32),
}
