//! # Control tick scheduler
//!
//! Runs the control core at a fixed period until the terminate flag is set. Each tick:
//!
//! 1. If calibration is in progress, zero the wheels, force the light on and skip everything else.
//! 2. Set the light from the mode (on for line following and the zone) unless overridden.
//! 3. Route to the active mode: manual demand passed straight through, line following (pre-empted
//!    by an open turn session, or by a full stop on an exit marker straight ahead), or the zone
//!    task.
//! 4. In line following, zero the motion if the front is blocked (unless turning).
//! 5. If the orientation is stale, scale the forward demand down and mark the tick degraded.
//! 6. Mix the motion into wheel demands and publish them.
//! 7. In line following, switch to the zone task when the silver strip is seen.

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

use crate::mixer::MixerError;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while building the scheduler. Once running the scheduler cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid drivetrain geometry: {0}")]
    MixerError(MixerError),

    #[error("Tick period must be positive and at most {max} s, found {0}", max = MAX_PERIOD_S)]
    InvalidPeriod(f64),

    #[error("Telemetry timeout must be positive and finite, found {0}")]
    InvalidTimeout(f64),
}
