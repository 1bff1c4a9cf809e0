//! # Motion mixer module
//!
//! Converts a body-frame velocity demand into four wheel demands for the omni-wheel drivetrain.
//! For a wheel mounted at angle θ the wheel fraction is:
//!
//! ```text
//! f = -sin(θ)·lateral + cos(θ)·forward + radius·angular
//! ```
//!
//! All four fractions are then divided by `max(1, max(|f|))`, so no wheel is ever asked for more
//! than full speed while the ratio between the wheels (and so the direction of travel) is kept.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the drivetrain geometry, raised when the mixer is built.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("Mounting angle of the {0:?} wheel is not finite")]
    NonFiniteAngle(Wheel),

    #[error("The {0:?} and {1:?} wheels share the same mounting angle")]
    DuplicateAngle(Wheel, Wheel),

    #[error("Robot radius must be positive and finite, found {0}")]
    InvalidRadius(f64),

    #[error("Wheel command limit must be positive, found {0}")]
    InvalidLimit(i32),
}
