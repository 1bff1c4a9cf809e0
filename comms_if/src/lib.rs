//! # Communications interface crate.
//!
//! Provides the typed messages exchanged between the rescue control core and its collaborators:
//! the vision producers, the motor/sensor microcontroller, and the operator interface.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator telecommands (mode selection, manual teleop, calibration)
pub mod tc;

/// Signal and command definitions for equipment (vision producers, microcontroller)
pub mod eqpt;
