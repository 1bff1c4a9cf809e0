//! # Intersection turn handler
//!
//! When an intersection marker is seen the handler opens a turn session which pre-empts line
//! following:
//!
//! ```text
//! Idle --marker (cooldown elapsed)--> Creeping --creep time--> Turning --complete--> Idle
//! ```
//!
//! Creeping drives straight forward to clear the marker. Turning rotates at a fixed rate until one
//! of the completion conditions holds, checked only once the minimum turn time has passed:
//!
//! 1. With fresh orientation, the heading change since the start of the turn matches the expected
//!    angle (90 degrees for left/right, 180 for an about face) within tolerance.
//! 2. Without usable orientation, the line is back in view with a small error.
//! 3. Regardless of either, the maximum turn time has elapsed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TurnCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TurnCtrlError {
    #[error("Current time is not a finite number: {0}")]
    NonFiniteTime(f64),
}
