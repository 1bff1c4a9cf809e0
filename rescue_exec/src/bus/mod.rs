//! # Shared state bus
//!
//! The bus is the only way the control core and its collaborators (vision, telemetry, actuator
//! transport and the operator interface) exchange data. It is a fixed set of typed fields, each
//! independently readable and writable:
//!
//! - Reading a field never blocks on a writer for longer than a value copy and never fails. Every
//!   field has a default, so reading before any producer has run is safe.
//! - Writing a field replaces the whole value atomically.
//! - There is no ordering guarantee between different fields. A snapshot taken by the control tick
//!   may mix values produced at slightly different times.
//!
//! Ownership is enforced by handing out ports rather than the bus itself. Each port can only write
//! the fields its role owns:
//!
//! | Port | Writes | Reads |
//! |---|---|---|
//! | [`VisionPort`] | perception | terminate |
//! | [`TelemetryPort`] | telemetry (stamped with its clock) | terminate |
//! | [`ActuatorPort`] | clears the one-shot servo preset | actuator demands, terminate |
//! | [`UiPort`] | mode, manual demand, calibration, light override, terminate | status |
//! | [`CorePort`] | actuator demands, status, mode (mission transitions only) | everything else |

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod field;
mod ports;
mod snapshot;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Internal
pub use field::Field;
pub use ports::*;
pub use snapshot::*;

use crate::{
    clock::Clock,
    mixer::{MotionCmd, WheelCmd},
    zone_mgr::{VictimCounts, ZoneTaskStatus},
};
use comms_if::{
    eqpt::{
        mcu::{Orientation, Proximity},
        vision::{ExitSignal, LineSignal, VictimDetection, ZoneMarkers},
    },
    tc::{CalibrationStatus, Mode},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The shared state bus.
///
/// Created once at startup. Cloning the bus clones the handles, not the values.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    perception: PerceptionFields,
    telemetry: TelemetryFields,
    actuator: ActuatorFields,
    ui: UiFields,
    status: StatusFields,

    /// Global cooperative cancellation flag.
    terminate: Field<bool>,
}

/// Fields written by the vision producers.
#[derive(Debug, Clone, Default)]
pub(crate) struct PerceptionFields {
    pub line: Field<LineSignal>,
    pub exit: Field<ExitSignal>,
    pub victim: Field<VictimDetection>,
    pub zone_markers: Field<ZoneMarkers>,
}

/// Fields written by the telemetry producer.
#[derive(Debug, Clone, Default)]
pub(crate) struct TelemetryFields {
    pub orientation: Field<Stamped<Orientation>>,
    pub proximity: Field<Stamped<Proximity>>,
}

/// Fields written by the control core for the actuator transport.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActuatorFields {
    pub wheels: Field<WheelCmd>,
    pub light_on: Field<bool>,

    /// One-shot servo preset, cleared by the transport once sent.
    pub servo_preset: Field<Option<u8>>,
}

/// Fields written by the operator interface.
#[derive(Debug, Clone, Default)]
pub(crate) struct UiFields {
    pub mode: Field<Mode>,
    pub manual: Field<MotionCmd>,
    pub calibration: Field<Calibration>,
    pub light_override: Field<Option<bool>>,
}

/// Fields written by the control core for display.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusFields {
    pub status: Field<String>,
    pub zone_status: Field<ZoneTaskStatus>,
    pub victim_counts: Field<VictimCounts>,
    pub degraded: Field<bool>,
}

/// Colour calibration state set by the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub status: CalibrationStatus,

    /// Name of the colour being calibrated.
    pub colour: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Bus {
    /// Create a new bus with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vision_port(&self) -> VisionPort {
        VisionPort::new(self.perception.clone(), self.terminate.clone())
    }

    /// Get a telemetry port which stamps every update with the given clock.
    pub fn telemetry_port(&self, clock: Arc<dyn Clock>) -> TelemetryPort {
        TelemetryPort::new(self.telemetry.clone(), clock, self.terminate.clone())
    }

    pub fn actuator_port(&self) -> ActuatorPort {
        ActuatorPort::new(self.actuator.clone(), self.terminate.clone())
    }

    pub fn ui_port(&self) -> UiPort {
        UiPort::new(self.ui.clone(), self.status.clone(), self.terminate.clone())
    }

    pub fn core_port(&self) -> CorePort {
        CorePort::new(
            self.perception.clone(),
            self.telemetry.clone(),
            self.actuator.clone(),
            self.ui.clone(),
            self.status.clone(),
            self.terminate.clone(),
        )
    }
}

impl Calibration {
    /// True while the robot must be frozen for calibration.
    pub fn in_progress(&self) -> bool {
        self.status != CalibrationStatus::None
    }
}
