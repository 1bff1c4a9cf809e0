//! Parameters structure for the motion mixer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{MixerError, Wheel};
use comms_if::eqpt::mcu::NUM_WHEELS;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drivetrain geometry used by the mixer.
#[derive(Debug, Clone, Deserialize)]
pub struct MixerParams {
    // ---- GEOMETRY ----
    /// Mounting angle of each wheel's drive direction, measured from straight ahead, in
    /// front-left, front-right, back-left, back-right order.
    ///
    /// Units: degrees
    pub wheel_angles_deg: [f64; NUM_WHEELS],

    /// Effective radius from the robot centre to the wheels, scaling the angular demand.
    ///
    /// Units: normalised
    pub robot_radius: f64,

    // ---- CAPABILITIES ----
    /// Largest magnitude wheel demand accepted by the microcontroller. A wheel fraction of 1.0
    /// maps onto this value.
    pub wheel_cmd_limit: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MixerParams {
    /// Check the geometry is usable.
    pub fn validate(&self) -> Result<(), MixerError> {
        for (i, wheel) in Wheel::ALL.iter().enumerate() {
            if !self.wheel_angles_deg[i].is_finite() {
                return Err(MixerError::NonFiniteAngle(*wheel));
            }

            for (j, other) in Wheel::ALL.iter().enumerate().skip(i + 1) {
                if self.wheel_angles_deg[i] == self.wheel_angles_deg[j] {
                    return Err(MixerError::DuplicateAngle(*wheel, *other));
                }
            }
        }

        if !(self.robot_radius.is_finite() && self.robot_radius > 0.0) {
            return Err(MixerError::InvalidRadius(self.robot_radius));
        }

        if self.wheel_cmd_limit <= 0 {
            return Err(MixerError::InvalidLimit(self.wheel_cmd_limit));
        }

        Ok(())
    }
}

impl Default for MixerParams {
    fn default() -> Self {
        Self {
            wheel_angles_deg: [45.0, -45.0, 135.0, -135.0],
            robot_radius: 0.12,
            wheel_cmd_limit: 255,
        }
    }
}
