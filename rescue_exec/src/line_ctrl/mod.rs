//! # Line following controller
//!
//! Proportional steering on the line's lateral error, with three fallbacks when the line is lost:
//! heading hold back toward the last heading the line was seen at, gap bridging (creep forward
//! slowly through a short gap in the line) and finally searching (stationary).

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

/// Possible errors that can occur during LineCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("Line lateral error is not a finite number: {0}")]
    NonFiniteError(f64),

    #[error("Current time is not a finite number: {0}")]
    NonFiniteTime(f64),
}
