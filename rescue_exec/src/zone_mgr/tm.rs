//! # Zone task telemetry
//!
//! Progress of the rescue task, published on the bus for the operator interface.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use comms_if::eqpt::vision::{DepositColour, VictimKind};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Number of victims of each kind handled during the mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictimCounts {
    pub silver: u32,
    pub black: u32,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Coarse task status of the zone manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTaskStatus {
    FindVictims,
    PickUp,
    Deposit(DepositColour),
    Exit,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl VictimCounts {
    pub fn increment(&mut self, kind: VictimKind) {
        match kind {
            VictimKind::Silver => self.silver += 1,
            VictimKind::Black => self.black += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.silver + self.black
    }
}

impl Default for ZoneTaskStatus {
    fn default() -> Self {
        ZoneTaskStatus::FindVictims
    }
}

impl std::fmt::Display for ZoneTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneTaskStatus::FindVictims => write!(f, "find_victims"),
            ZoneTaskStatus::PickUp => write!(f, "pickup_victim"),
            ZoneTaskStatus::Deposit(c) => write!(f, "deposit_{}", c),
            ZoneTaskStatus::Exit => write!(f, "exit"),
        }
    }
}
