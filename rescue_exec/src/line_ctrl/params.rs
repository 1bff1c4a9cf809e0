//! Parameters structure for LineCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the line following controller.
#[derive(Debug, Clone, Deserialize)]
pub struct LineCtrlParams {
    // ---- TRACKING ----
    /// Angular demand per unit of lateral error.
    pub steering_gain: f64,

    /// Forward demand on a straight, level line.
    pub base_forward: f64,

    /// Lateral demand while tracking.
    pub base_lateral: f64,

    /// How quickly forward speed drops off with lateral error.
    pub turn_speed_gain: f64,

    /// Smallest fraction of the base forward demand used on sharp error, so the robot never
    /// stalls on a bend.
    pub floor_scale: f64,

    /// Angular bias toward an intersection marker seen ahead.
    pub marker_bias: f64,

    // ---- LINE LOST ----
    /// Angular demand per 90 degrees of heading error while holding heading.
    pub heading_hold_gain: f64,

    /// How long the line may be lost before gap bridging starts.
    ///
    /// Units: seconds
    pub gap_grace_s: f64,

    /// How long after the line was lost gap bridging gives up.
    ///
    /// Units: seconds
    pub gap_timeout_s: f64,

    /// Forward demand while bridging a gap.
    pub gap_speed: f64,

    // ---- RAMPS ----
    /// Pitch above which the robot is considered to be climbing a ramp.
    ///
    /// Units: degrees
    pub ramp_up_pitch_deg: f64,

    /// Pitch below which the robot is considered to be descending a ramp.
    ///
    /// Units: degrees
    pub ramp_down_pitch_deg: f64,

    /// Forward demand replacing `base_forward` when climbing.
    pub ramp_up_speed: f64,

    /// Forward demand replacing `base_forward` when descending.
    pub ramp_down_speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineCtrlParams {
    fn default() -> Self {
        Self {
            steering_gain: 220.0 / 255.0,
            base_forward: 0.35,
            base_lateral: 0.0,
            turn_speed_gain: 0.7,
            floor_scale: 0.25,
            marker_bias: 20.0 / 255.0,
            heading_hold_gain: 0.8,
            gap_grace_s: 0.4,
            gap_timeout_s: 1.2,
            gap_speed: 0.18,
            ramp_up_pitch_deg: 10.0,
            ramp_down_pitch_deg: -10.0,
            ramp_up_speed: 0.2,
            ramp_down_speed: 0.15,
        }
    }
}
