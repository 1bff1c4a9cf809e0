//! # [`ZoneMgr<TransitToDrop>`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{
    drop::DropPrepareTurn, params::ZoneMgrParams, InputData, StepOutput, ZoneMgrPersistantData,
    ZonePhase,
};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Transit phase of the ZoneMgr, driving toward the deposit zone matching the victim carried.
///
/// If the marker isn't visible the robot rotates in place looking for it rather than driving
/// blind.
///
/// Possible transitions:
/// - DropPrepareTurn, once a front proximity reading drops below the drop threshold
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitToDrop;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransitParams {
    /// Lateral demand per unit of marker error.
    pub strafe_gain: f64,

    /// Forward demand toward the marker.
    pub forward: f64,

    /// Front proximity reading below which the robot is at the deposit zone.
    pub front_drop_threshold: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TransitToDrop {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let p = &params.transit;
        let target = persistant.target;
        let marker = input.perception.zone_markers.get(target);

        if !marker.found {
            return StepOutput::motion(
                MotionCmd::rotate(params.search.rotate_rate),
                format!("Searching drop {}", target),
            );
        }

        let prox = &input.proximity;
        if prox.front_left < p.front_drop_threshold || prox.front_right < p.front_drop_threshold {
            return StepOutput::transition(
                ZonePhase::DropPrepareTurn(DropPrepareTurn::new(input.now_s)),
                format!("At drop {}", target),
            );
        }

        StepOutput::motion(
            MotionCmd::new(p.strafe_gain * marker.lateral_error, p.forward, 0.0),
            format!("Drop {} err={:.2}", target, marker.lateral_error),
        )
    }
}

impl Default for TransitParams {
    fn default() -> Self {
        Self {
            strafe_gain: 0.6,
            forward: 0.2,
            front_drop_threshold: 700,
        }
    }
}
