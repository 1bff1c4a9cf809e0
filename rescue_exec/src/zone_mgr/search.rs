//! # [`ZoneMgr<Search>`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{
    approach::Approach, params::ZoneMgrParams, InputData, StepOutput, ZoneMgrPersistantData,
    ZonePhase,
};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Search phase of the ZoneMgr, rotating slowly in place until a victim is seen.
///
/// Possible transitions:
/// - Approach, on a detection above the minimum confidence
#[derive(Debug, Clone, Copy, Default)]
pub struct Search;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchParams {
    /// Angular demand while searching for victims, deposit markers or the exit.
    pub rotate_rate: f64,

    /// Minimum detector confidence which counts as a victim.
    pub confidence_min: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Search {
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

        if victim.is_detected(params.search.confidence_min) {
            return StepOutput::transition(ZonePhase::Approach(Approach::new()), "Victim found");
        }

        StepOutput::motion(MotionCmd::rotate(params.search.rotate_rate), "Zone search")
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            rotate_rate: 0.2,
            confidence_min: 0.3,
        }
    }
}
