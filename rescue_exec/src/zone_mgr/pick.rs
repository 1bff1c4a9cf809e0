//! # [`ZoneMgr<PickPrepare>`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::vision::{DepositColour, VictimKind};
use log::info;
use serde::Deserialize;

use super::{
    params::ZoneMgrParams, transit::TransitToDrop, InputData, ServoSequence, StepOutput,
    ZoneMgrPersistantData, ZonePhase,
};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pick phase of the ZoneMgr. The robot halts while the gripper is lowered then raised with the
/// victim. Once the gripper is up the victim is counted and the deposit colour selected.
///
/// Possible transitions:
/// - TransitToDrop, once the servo sequence is complete
#[derive(Debug, Clone)]
pub struct PickPrepare {
    /// Kind of victim classified when the approach completed.
    kind: VictimKind,

    servos: Option<ServoSequence>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PickParams {
    /// Time allowed for each servo preset to execute.
    ///
    /// Units: seconds
    pub servo_step_s: f64,

    pub lower_preset: u8,

    pub raise_preset: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PickPrepare {
    pub fn new(kind: VictimKind) -> Self {
        Self { kind, servos: None }
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let p = &params.pick;
        let servos = self.servos.get_or_insert_with(|| {
            ServoSequence::new(vec![p.lower_preset, p.raise_preset], p.servo_step_s)
        });

        let (preset, done) = servos.step(input.now_s);

        if !done {
            return StepOutput::motion(MotionCmd::stop(), "Picking").with_servo(preset);
        }

        persistant.counts.increment(self.kind);
        persistant.target = DepositColour::for_victim(self.kind);

        info!(
            "Picked up {:?} victim, depositing in {} zone ({} rescued: {} silver, {} black)",
            self.kind,
            persistant.target,
            persistant.counts.total(),
            persistant.counts.silver,
            persistant.counts.black
        );

        StepOutput::transition(
            ZonePhase::TransitToDrop(TransitToDrop::new()),
            format!("Picked {:?}", self.kind),
        )
    }
}

impl Default for PickParams {
    fn default() -> Self {
        Self {
            servo_step_s: 0.4,
            lower_preset: 1,
            raise_preset: 2,
        }
    }
}
