//! # Drop phases of the ZoneMgr
//!
//! Depositing a victim takes three phases: turn the back of the robot toward the zone, reverse
//! up to it, then open and close the gate for the zone's colour.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::vision::DepositColour;
use log::info;
use serde::Deserialize;

use super::{
    exit::Exit, params::ZoneMgrParams, search::Search, InputData, ServoSequence, StepOutput,
    ZoneMgrPersistantData, ZonePhase,
};
use crate::mixer::MotionCmd;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Rotate about face for a fixed time.
///
/// Possible transitions:
/// - DropReverse, once the turn time has elapsed
#[derive(Debug, Clone, Copy)]
pub struct DropPrepareTurn {
    start_s: f64,
}

/// Reverse into the deposit zone.
///
/// Possible transitions:
/// - DropRelease, once the rear proximity sensor confirms contact or the timeout elapses
#[derive(Debug, Clone, Copy)]
pub struct DropReverse {
    start_s: f64,
}

/// Open then close the gate for the target colour.
///
/// Possible transitions:
/// - Search, if the victim quota hasn't been met
/// - Exit, once it has
#[derive(Debug, Clone, Default)]
pub struct DropRelease {
    servos: Option<ServoSequence>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DropParams {
    /// Angular demand of the about face before reversing.
    pub about_face_rate: f64,

    /// Units: seconds
    pub about_face_duration_s: f64,

    /// Reverse speed magnitude.
    pub reverse_speed: f64,

    /// Longest time spent reversing.
    ///
    /// Units: seconds
    pub reverse_timeout_s: f64,

    /// Rear proximity reading below which the robot is against the zone. Zero means no reading.
    pub rear_drop_threshold: i32,

    /// Time allowed for each gate servo preset.
    ///
    /// Units: seconds
    pub servo_step_s: f64,

    /// Gate open and close presets of the green zone.
    pub green_gate_presets: [u8; 2],

    /// Gate open and close presets of the red zone.
    pub red_gate_presets: [u8; 2],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DropPrepareTurn {
    pub fn new(start_s: f64) -> Self {
        Self { start_s }
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        _persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let p = &params.drop;

        if input.now_s - self.start_s > p.about_face_duration_s {
            return StepOutput::transition(
                ZonePhase::DropReverse(DropReverse::new(input.now_s)),
                "Drop turn done",
            );
        }

        StepOutput::motion(MotionCmd::rotate(p.about_face_rate), "Drop prepare turn")
    }
}

impl DropReverse {
    pub fn new(start_s: f64) -> Self {
        Self { start_s }
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        _persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let p = &params.drop;
        let rear = input.proximity.rear;

        if rear > 0 && rear < p.rear_drop_threshold {
            return StepOutput::transition(
                ZonePhase::DropRelease(DropRelease::new()),
                "Rear contact",
            );
        }

        if input.now_s - self.start_s > p.reverse_timeout_s {
            return StepOutput::transition(
                ZonePhase::DropRelease(DropRelease::new()),
                "Reverse timed out",
            );
        }

        StepOutput::motion(MotionCmd::new(0.0, -p.reverse_speed, 0.0), "Drop reverse")
    }
}

impl DropRelease {
    pub fn new() -> Self {
        Self { servos: None }
    }

    pub fn step(
        &mut self,
        params: &ZoneMgrParams,
        persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        let p = &params.drop;
        let target = persistant.target;

        let servos = self.servos.get_or_insert_with(|| {
            let presets = match target {
                DepositColour::Green => p.green_gate_presets,
                DepositColour::Red => p.red_gate_presets,
            };
            ServoSequence::new(presets.to_vec(), p.servo_step_s)
        });

        let (preset, done) = servos.step(input.now_s);

        if !done {
            return StepOutput::motion(MotionCmd::stop(), format!("Releasing to {}", target))
                .with_servo(preset);
        }

        let counts = persistant.counts;
        let quota = &params.quota;

        if counts.silver < quota.silver || counts.black < quota.black {
            StepOutput::transition(ZonePhase::Search(Search::new()), "Released, searching")
        } else {
            info!(
                "Victim quota met (silver: {}, black: {}), exiting the zone",
                counts.silver, counts.black
            );
            StepOutput::transition(ZonePhase::Exit(Exit::new()), "Released, quota met")
        }
    }
}

impl Default for DropParams {
    fn default() -> Self {
        Self {
            about_face_rate: 0.8,
            about_face_duration_s: 1.0,
            reverse_speed: 0.12,
            reverse_timeout_s: 1.0,
            rear_drop_threshold: 700,
            servo_step_s: 0.3,
            green_gate_presets: [4, 5],
            red_gate_presets: [6, 7],
        }
    }
}
