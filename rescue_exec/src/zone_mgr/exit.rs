//! # [`ZoneMgr<Exit>`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{params::ZoneMgrParams, InputData, StepOutput, ZoneMgrPersistantData};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Exit phase of the ZoneMgr, rotating in place until the line or the exit marker is seen.
///
/// Completion hands the robot back to line following.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exit;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Exit {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        _persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let perception = &input.perception;

        if perception.line.found || perception.exit.found {
            return StepOutput::motion(MotionCmd::stop(), "Zone exit found").exit_to_line();
        }

        StepOutput::motion(MotionCmd::rotate(params.search.rotate_rate), "Zone exit")
    }
}
