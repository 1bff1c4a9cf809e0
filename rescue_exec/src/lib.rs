//! # Rescue robot control library.
//!
//! This library allows the executable, the integration tests and the benches to access the control
//! core of the rescue robot.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Shared state bus - the typed fields and single-writer ports every collaborator talks through
pub mod bus;

/// Clocks - monotonic wall time for the robot, virtual time for tests and simulation
pub mod clock;

/// Data store - per-execution scratch data of the control core
pub mod data_store;

/// Line following controller - proportional steering with heading hold and gap bridging
pub mod line_ctrl;

/// Microcontroller link - sends actuator demands to, and receives telemetry from, the MCU
#[cfg(feature = "mcu")]
pub mod mcu_link;

/// Motion mixer - converts body-frame velocity into omni wheel demands
pub mod mixer;

/// Control tick scheduler - runs the mode logic at a fixed period
pub mod scheduler;

/// Intersection turn handler
pub mod turn_ctrl;

/// Zone manager - the victim rescue state machine
pub mod zone_mgr;
