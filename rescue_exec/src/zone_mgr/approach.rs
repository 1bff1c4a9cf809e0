//! # [`ZoneMgr<Approach>`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::Deserialize;

use super::{
    params::ZoneMgrParams, pick::PickPrepare, search::Search, InputData, StepOutput,
    ZoneMgrPersistantData, ZonePhase,
};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Approach phase of the ZoneMgr, strafing onto the victim while creeping forward.
///
/// Possible transitions:
/// - PickPrepare, once the victim is centred and close enough (apparent width)
/// - Search, if the victim is lost
#[derive(Debug, Clone, Copy, Default)]
pub struct Approach;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApproachParams {
    /// Lateral demand per unit of victim error.
    pub strafe_gain: f64,

    /// Forward demand while approaching.
    pub forward: f64,

    /// Largest victim error which counts as centred.
    pub align_error: f64,

    /// Apparent width above which the victim is in reach.
    ///
    /// Units: pixels
    pub width_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Approach {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        _persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let victim = &input.perception.victim;

        let kind = match victim.kind {
            Some(k) if victim.is_detected(params.search.confidence_min) => k,
            _ => {
                info!("Victim lost during approach, searching again");
                return StepOutput::transition(ZonePhase::Search(Search::new()), "Victim lost");
            }
        };

        let p = &params.approach;
        let err = victim.lateral_error;
        let in_reach = victim
            .apparent_width
            .map_or(false, |w| w > p.width_threshold);

        if err.abs() < p.align_error && in_reach {
            return StepOutput::transition(
                ZonePhase::PickPrepare(PickPrepare::new(kind)),
                format!("Victim ({:?}) in reach", kind),
            );
        }

        StepOutput::motion(
            MotionCmd::new(p.strafe_gain * err, p.forward, 0.0),
            format!("Approach victim err={:.2}", err),
        )
    }
}

impl Default for ApproachParams {
    fn default() -> Self {
        Self {
            strafe_gain: 0.8,
            forward: 0.12,
            align_error: 0.05,
            width_threshold: 80.0,
        }
    }
}
