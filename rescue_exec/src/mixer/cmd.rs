//! Command types handled by the mixer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mcu::NUM_WHEELS;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A body-frame velocity demand.
///
/// Each component is a unit-less fraction, roughly in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionCmd {
    /// Sideways velocity, positive to the right.
    pub lateral: f64,

    /// Forward velocity, positive ahead.
    pub forward: f64,

    /// Angular velocity, positive anticlockwise seen from above.
    pub angular: f64,
}

/// Per-wheel speed fractions, in front-left, front-right, back-left, back-right order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelFractions(pub [f64; NUM_WHEELS]);

/// Signed integer wheel demands accepted by the motor microcontroller, in front-left, front-right,
/// back-left, back-right order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelCmd(pub [i32; NUM_WHEELS]);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The wheels of the drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionCmd {
    pub fn new(lateral: f64, forward: f64, angular: f64) -> Self {
        Self {
            lateral,
            forward,
            angular,
        }
    }

    /// A command which holds the robot still.
    pub fn stop() -> Self {
        Self::default()
    }

    /// A pure rotation in place.
    pub fn rotate(angular: f64) -> Self {
        Self::new(0.0, 0.0, angular)
    }

    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.lateral.is_finite() && self.forward.is_finite() && self.angular.is_finite()
    }
}

impl Wheel {
    /// All wheels in command order.
    pub const ALL: [Wheel; NUM_WHEELS] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::BackLeft,
        Wheel::BackRight,
    ];

    /// Index of the wheel in the command arrays.
    pub fn index(self) -> usize {
        match self {
            Wheel::FrontLeft => 0,
            Wheel::FrontRight => 1,
            Wheel::BackLeft => 2,
            Wheel::BackRight => 3,
        }
    }
}

impl WheelFractions {
    pub fn get(&self, wheel: Wheel) -> f64 {
        self.0[wheel.index()]
    }

    /// Largest magnitude of any wheel fraction.
    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0, |m, f| f.abs().max(m))
    }
}

impl WheelCmd {
    /// All wheels stopped.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }
}
