//! Parameters structure for TurnCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::TurnDirection;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the intersection turn handler.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnCtrlParams {
    // ---- TIMING ----
    /// Time spent creeping forward over the marker before rotating.
    ///
    /// Units: seconds
    pub creep_duration_s: f64,

    /// Forward demand while creeping.
    pub creep_speed: f64,

    /// Completion is not checked before this time has elapsed since the session opened.
    ///
    /// Units: seconds
    pub min_duration_s: f64,

    /// A session is always closed after this long.
    ///
    /// Units: seconds
    pub max_duration_s: f64,

    /// Minimum time between one turn completing and the next one opening.
    ///
    /// Units: seconds
    pub cooldown_s: f64,

    // ---- RATES ----
    /// Angular demand magnitude for left and right turns.
    pub turn_rate: f64,

    /// Angular demand magnitude for about faces.
    pub about_face_rate: f64,

    // ---- COMPLETION ----
    /// Largest line error that counts as having reacquired the line.
    pub reacquire_error: f64,

    /// Use orientation to judge turn completion when it is fresh.
    pub use_orientation: bool,

    /// Expected heading change of a left or right turn.
    ///
    /// Units: degrees
    pub turn_angle_deg: f64,

    /// Tolerance on the expected heading change.
    ///
    /// Units: degrees
    pub angle_tolerance_deg: f64,

    /// Sign applied to yaw deltas, -1 if the IMU reports clockwise as positive.
    pub yaw_sign: f64,

    // ---- ABOUT FACE ----
    /// How the rotation direction of an about face is chosen.
    pub about_face_policy: AboutFacePolicy,

    /// Direction assumed for the last single-direction turn before any has been made.
    pub initial_last_direction: TurnDirection,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Policy for the rotation direction of an about face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AboutFacePolicy {
    /// Rotate the same way as the most recent left or right turn.
    MirrorLast,

    AlwaysLeft,

    AlwaysRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TurnCtrlParams {
    fn default() -> Self {
        Self {
            creep_duration_s: 0.2,
            creep_speed: 0.2,
            min_duration_s: 0.25,
            max_duration_s: 1.6,
            cooldown_s: 0.8,
            turn_rate: 0.8,
            about_face_rate: 0.9,
            reacquire_error: 0.2,
            use_orientation: true,
            turn_angle_deg: 90.0,
            angle_tolerance_deg: 8.0,
            yaw_sign: 1.0,
            about_face_policy: AboutFacePolicy::MirrorLast,
            initial_last_direction: TurnDirection::Right,
        }
    }
}
