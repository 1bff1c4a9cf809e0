//! # ZoneMgr module
//!
//! This module implements the [`ZoneMgr`] state machine, which sequences the victim rescue task
//! inside the evacuation zone. The task is broken down into the following phases:
//!
//! - `Search` - rotate slowly in place looking for a victim.
//! - `Approach` - strafe onto the victim while creeping forward.
//! - `PickPrepare` - halt, lower and raise the gripper, classify and count the victim.
//! - `TransitToDrop` - drive to the deposit zone matching the victim, searching for its marker if
//!   it isn't visible.
//! - `DropPrepareTurn` - about face so the gate faces the zone.
//! - `DropReverse` - reverse into the zone.
//! - `DropRelease` - open and close the gate, then search again or exit once the quota is met.
//! - `Exit` - search for the line or the exit marker, then hand back to line following.
//!
//! Whenever the front of the robot is blocked the motion demand is zeroed and the phase is held,
//! except in the two servo phases which keep sequencing (the robot is stationary in them anyway).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod approach;
mod drop;
mod exit;
mod params;
mod pick;
mod search;
pub mod tm;
mod transit;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use log::{info, trace};
use serde::Serialize;

pub use self::{
    approach::ApproachParams,
    drop::DropParams,
    params::{QuotaParams, ZoneMgrParams},
    pick::PickParams,
    search::SearchParams,
    tm::{VictimCounts, ZoneTaskStatus},
    transit::TransitParams,
};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub mod phases {
    pub use super::approach::Approach;
    pub use super::drop::{DropPrepareTurn, DropRelease, DropReverse};
    pub use super::exit::Exit;
    pub use super::pick::PickPrepare;
    pub use super::search::Search;
    pub use super::transit::TransitToDrop;
}

use crate::{bus::PerceptionSnapshot, mixer::MotionCmd};
use comms_if::eqpt::{mcu::Proximity, vision::DepositColour};
use phases::*;
use util::{module::State, params as params_util};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Zone Manager
///
/// Owns the current phase of the rescue task and the data which must survive phase changes.
#[derive(Debug, Default)]
pub struct ZoneMgr {
    /// Parameters for the ZoneMgr and all its phases.
    pub params: ZoneMgrParams,

    /// Persistant data of the ZoneMgr, valid over all phases.
    pub persistant: ZoneMgrPersistantData,

    phase: ZonePhase,

    report: StatusReport,
}

/// Data which persists across phases.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ZoneMgrPersistantData {
    /// Deposit zone the current victim is destined for.
    pub target: DepositColour,

    /// Victims handled so far. Counts persist for the whole mission, they are not cleared when the
    /// task is reset.
    pub counts: VictimCounts,
}

/// Input data to the ZoneMgr.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    pub now_s: f64,

    pub perception: PerceptionSnapshot,

    pub proximity: Proximity,

    /// True if either front proximity sensor reads above the block threshold.
    pub blocked: bool,
}

/// Demands produced by the ZoneMgr on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutputData {
    pub motion: MotionCmd,

    /// One-shot servo preset to execute.
    pub servo_preset: Option<u8>,

    /// The task is over, the robot should go back to line following.
    pub exit_to_line: bool,
}

/// Status report for ZoneMgr processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub phase: ZonePhaseId,

    pub zone_status: ZoneTaskStatus,

    pub counts: VictimCounts,

    pub blocked: bool,

    /// Human readable summary of what the phase is doing.
    pub status: String,
}

/// Output of a phase's step function.
#[derive(Debug)]
pub struct StepOutput {
    /// Phase to switch to at the end of this tick
    pub transition: Option<ZonePhase>,

    pub motion: MotionCmd,

    pub servo_preset: Option<u8>,

    pub exit_to_line: bool,

    pub status: String,
}

/// A timed sequence of one-shot servo presets.
///
/// The first preset is issued on the first step, each following preset once `step_s` has elapsed
/// since the previous one, and the sequence is done `step_s` after the last.
#[derive(Debug, Clone)]
pub struct ServoSequence {
    presets: Vec<u8>,
    step_s: f64,
    num_issued: usize,
    last_issue_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during ZoneMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum ZoneMgrError {
    #[error("Current time is not a finite number: {0}")]
    NonFiniteTime(f64),
}

#[derive(Debug, Clone)]
pub enum ZonePhase {
    Search(Search),
    Approach(Approach),
    PickPrepare(PickPrepare),
    TransitToDrop(TransitToDrop),
    DropPrepareTurn(DropPrepareTurn),
    DropReverse(DropReverse),
    DropRelease(DropRelease),
    Exit(Exit),
}

/// Identifier of a phase, without the phase's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZonePhaseId {
    Search,
    Approach,
    PickPrepare,
    TransitToDrop,
    DropPrepareTurn,
    DropReverse,
    DropRelease,
    Exit,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl State for ZoneMgr {
    type InitData = &'static str;
    type InitError = params_util::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ZoneMgrError;

    /// Initialise the ZoneMgr.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = params_util::load_or_default(init_data)?;
        self.reset();
        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input_data.now_s.is_finite() {
            return Err(ZoneMgrError::NonFiniteTime(input_data.now_s));
        }

        let mut output = OutputData::default();
        let blocked = input_data.blocked && !self.phase.is_servo_phase();

        let status = if blocked {
            // Safety override, hold the phase and stop
            String::from("Blocked (proximity) zone")
        } else {
            let step = self
                .phase
                .step(&self.params, &mut self.persistant, input_data);

            output.motion = step.motion;
            output.servo_preset = step.servo_preset;
            output.exit_to_line = step.exit_to_line;

            if let Some(next) = step.transition {
                info!("ZoneMgr phase change: {} -> {}", self.phase, next);
                self.phase = next;
            }

            if step.exit_to_line {
                info!("ZoneMgr task complete, returning to line following");
                self.reset();
            }

            step.status
        };

        self.report = StatusReport {
            phase: self.phase.id(),
            zone_status: self.zone_status(),
            counts: self.persistant.counts,
            blocked,
            status,
        };

        trace!("ZoneMgr output: {:?}, report: {:?}", output, self.report);

        Ok((output, self.report.clone()))
    }

    /// Return to search with the green zone targeted. Victim counts are kept.
    fn reset(&mut self) {
        self.phase = ZonePhase::Search(Search::new());
        self.persistant.target = DepositColour::Green;
        self.report = StatusReport {
            counts: self.persistant.counts,
            ..Default::default()
        };
    }
}

impl ZoneMgr {
    pub fn with_params(params: ZoneMgrParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> ZonePhaseId {
        self.phase.id()
    }

    pub fn counts(&self) -> VictimCounts {
        self.persistant.counts
    }

    /// Coarse task status derived from the current phase.
    pub fn zone_status(&self) -> ZoneTaskStatus {
        match self.phase.id() {
            ZonePhaseId::Search | ZonePhaseId::Approach => ZoneTaskStatus::FindVictims,
            ZonePhaseId::PickPrepare => ZoneTaskStatus::PickUp,
            ZonePhaseId::TransitToDrop
            | ZonePhaseId::DropPrepareTurn
            | ZonePhaseId::DropReverse
            | ZonePhaseId::DropRelease => ZoneTaskStatus::Deposit(self.persistant.target),
            ZonePhaseId::Exit => ZoneTaskStatus::Exit,
        }
    }
}

impl Default for ZonePhase {
    fn default() -> Self {
        ZonePhase::Search(Search::new())
    }
}

impl ZonePhase {
    fn step(
        &mut self,
        params: &ZoneMgrParams,
        persistant: &mut ZoneMgrPersistantData,
        input: &InputData,
    ) -> StepOutput {
        match self {
            ZonePhase::Search(s) => s.step(params, persistant, input),
            ZonePhase::Approach(s) => s.step(params, persistant, input),
            ZonePhase::PickPrepare(s) => s.step(params, persistant, input),
            ZonePhase::TransitToDrop(s) => s.step(params, persistant, input),
            ZonePhase::DropPrepareTurn(s) => s.step(params, persistant, input),
            ZonePhase::DropReverse(s) => s.step(params, persistant, input),
            ZonePhase::DropRelease(s) => s.step(params, persistant, input),
            ZonePhase::Exit(s) => s.step(params, persistant, input),
        }
    }

    pub fn id(&self) -> ZonePhaseId {
        match self {
            ZonePhase::Search(_) => ZonePhaseId::Search,
            ZonePhase::Approach(_) => ZonePhaseId::Approach,
            ZonePhase::PickPrepare(_) => ZonePhaseId::PickPrepare,
            ZonePhase::TransitToDrop(_) => ZonePhaseId::TransitToDrop,
            ZonePhase::DropPrepareTurn(_) => ZonePhaseId::DropPrepareTurn,
            ZonePhase::DropReverse(_) => ZonePhaseId::DropReverse,
            ZonePhase::DropRelease(_) => ZonePhaseId::DropRelease,
            ZonePhase::Exit(_) => ZonePhaseId::Exit,
        }
    }

    /// Servo phases keep sequencing when the front is blocked.
    pub fn is_servo_phase(&self) -> bool {
        matches!(self, ZonePhase::PickPrepare(_) | ZonePhase::DropRelease(_))
    }
}

impl Display for ZonePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl Default for ZonePhaseId {
    fn default() -> Self {
        ZonePhaseId::Search
    }
}

impl Display for ZonePhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZonePhaseId::Search => write!(f, "ZonePhase::Search"),
            ZonePhaseId::Approach => write!(f, "ZonePhase::Approach"),
            ZonePhaseId::PickPrepare => write!(f, "ZonePhase::PickPrepare"),
            ZonePhaseId::TransitToDrop => write!(f, "ZonePhase::TransitToDrop"),
            ZonePhaseId::DropPrepareTurn => write!(f, "ZonePhase::DropPrepareTurn"),
            ZonePhaseId::DropReverse => write!(f, "ZonePhase::DropReverse"),
            ZonePhaseId::DropRelease => write!(f, "ZonePhase::DropRelease"),
            ZonePhaseId::Exit => write!(f, "ZonePhase::Exit"),
        }
    }
}

impl StepOutput {
    /// Stay in the current phase with the given motion.
    pub fn motion<S: Into<String>>(motion: MotionCmd, status: S) -> Self {
        Self {
            transition: None,
            motion,
            servo_preset: None,
            exit_to_line: false,
            status: status.into(),
        }
    }

    /// Stop and switch to `next` at the end of this tick.
    pub fn transition<S: Into<String>>(next: ZonePhase, status: S) -> Self {
        Self {
            transition: Some(next),
            ..Self::motion(MotionCmd::stop(), status)
        }
    }

    pub fn with_servo(mut self, preset: Option<u8>) -> Self {
        self.servo_preset = preset;
        self
    }

    pub fn exit_to_line(mut self) -> Self {
        self.exit_to_line = true;
        self
    }
}

impl ServoSequence {
    pub fn new(presets: Vec<u8>, step_s: f64) -> Self {
        Self {
            presets,
            step_s,
            num_issued: 0,
            last_issue_s: 0.0,
        }
    }

    /// Advance the sequence, returning the preset to issue on this tick (if any) and whether the
    /// sequence has finished.
    pub fn step(&mut self, now_s: f64) -> (Option<u8>, bool) {
        if self.num_issued > 0 && now_s - self.last_issue_s < self.step_s {
            return (None, false);
        }

        match self.presets.get(self.num_issued) {
            Some(&preset) => {
                self.num_issued += 1;
                self.last_issue_s = now_s;
                (Some(preset), false)
            }
            None => (None, true),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use comms_if::eqpt::vision::{VictimDetection, VictimKind, ZoneMarker};

    const DT: f64 = 0.02;

    fn victim(kind: VictimKind) -> VictimDetection {
        VictimDetection {
            kind: Some(kind),
            lateral_error: 0.0,
            confidence: 0.9,
            apparent_width: Some(100.0),
        }
    }

    fn input(now_s: f64) -> InputData {
        let mut input = InputData {
            now_s,
            ..Default::default()
        };
        input.proximity.front_left = 500;
        input.proximity.front_right = 500;
        input
    }

    #[test]
    fn test_servo_sequence_timing() {
        let mut seq = ServoSequence::new(vec![4, 5], 0.3);
        assert_eq!(seq.step(1.0), (Some(4), false));
        assert_eq!(seq.step(1.2), (None, false));
        assert_eq!(seq.step(1.3), (Some(5), false));
        assert_eq!(seq.step(1.5), (None, false));
        assert_eq!(seq.step(1.61), (None, true));
    }

    #[test]
    fn test_full_rescue_sequence() {
        let mut zm = ZoneMgr::default();
        let mut phases = vec![zm.phase()];
        let mut presets = vec![];
        let mut t = 0.0;

        while t < 20.0 {
            let mut inp = input(t);
            inp.perception.victim = victim(VictimKind::Silver);
            inp.perception.zone_markers.green = ZoneMarker {
                found: true,
                lateral_error: 0.1,
            };

            let (out, rpt) = zm.proc(&inp).unwrap();
            if let Some(p) = out.servo_preset {
                presets.push(p);
            }
            if phases.last() != Some(&rpt.phase) {
                phases.push(rpt.phase);
            }
            if phases.len() > 1 && rpt.phase == ZonePhaseId::Search {
                break;
            }

            t += DT;
        }

        assert_eq!(
            phases,
            vec![
                ZonePhaseId::Search,
                ZonePhaseId::Approach,
                ZonePhaseId::PickPrepare,
                ZonePhaseId::TransitToDrop,
                ZonePhaseId::DropPrepareTurn,
                ZonePhaseId::DropReverse,
                ZonePhaseId::DropRelease,
                ZonePhaseId::Search,
            ]
        );
        assert_eq!(presets, vec![1, 2, 4, 5]);
        assert_eq!(
            zm.counts(),
            VictimCounts {
                silver: 1,
                black: 0
            }
        );
        assert!(t < 10.0);
    }

    #[test]
    fn test_black_victim_goes_to_red() {
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::PickPrepare(PickPrepare::new(VictimKind::Black));

        let mut t = 0.0;
        while zm.phase() == ZonePhaseId::PickPrepare {
            zm.proc(&input(t)).unwrap();
            t += DT;
            assert!(t < 5.0);
        }

        assert_eq!(zm.counts().black, 1);
        assert_eq!(zm.zone_status(), ZoneTaskStatus::Deposit(DepositColour::Red));
    }

    #[test]
    fn test_blocked_holds_phase_and_stops() {
        let mut zm = ZoneMgr::default();
        let mut inp = input(0.0);
        inp.perception.victim = victim(VictimKind::Silver);
        inp.blocked = true;

        let (out, rpt) = zm.proc(&inp).unwrap();
        assert_eq!(out.motion, MotionCmd::stop());
        assert_eq!(rpt.phase, ZonePhaseId::Search);
        assert!(rpt.blocked);
    }

    #[test]
    fn test_servo_phase_runs_while_blocked() {
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::PickPrepare(PickPrepare::new(VictimKind::Silver));

        let mut inp = input(0.0);
        inp.blocked = true;

        let (out, rpt) = zm.proc(&inp).unwrap();
        assert_eq!(out.servo_preset, Some(1));
        assert!(!rpt.blocked);
    }

    #[test]
    fn test_transit_searches_without_marker() {
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::TransitToDrop(TransitToDrop::new());

        let (out, rpt) = zm.proc(&input(0.0)).unwrap();
        assert_eq!(out.motion, MotionCmd::rotate(zm.params.search.rotate_rate));
        assert_eq!(rpt.phase, ZonePhaseId::TransitToDrop);
    }

    #[test]
    fn test_approach_reverts_when_victim_lost() {
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::Approach(Approach::new());

        let (_, rpt) = zm.proc(&input(0.0)).unwrap();
        assert_eq!(rpt.phase, ZonePhaseId::Search);
    }

    #[test]
    fn test_quota_then_exit_to_line() {
        let mut zm = ZoneMgr::default();
        zm.persistant.counts = VictimCounts {
            silver: 2,
            black: 1,
        };
        zm.phase = ZonePhase::DropRelease(DropRelease::new());

        let mut t = 0.0;
        while zm.phase() == ZonePhaseId::DropRelease {
            zm.proc(&input(t)).unwrap();
            t += DT;
            assert!(t < 5.0);
        }
        assert_eq!(zm.phase(), ZonePhaseId::Exit);
        assert_eq!(zm.zone_status(), ZoneTaskStatus::Exit);

        let (out, _) = zm.proc(&input(t)).unwrap();
        assert!(!out.exit_to_line);

        let mut inp = input(t + DT);
        inp.perception.line.found = true;
        let (out, rpt) = zm.proc(&inp).unwrap();
        assert!(out.exit_to_line);
        assert_eq!(rpt.phase, ZonePhaseId::Search);
        assert_eq!(zm.counts().total(), 3);
    }

    #[test]
    fn test_rear_contact_ends_reverse() {
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::DropReverse(DropReverse::new(0.0));

        let mut inp = input(DT);
        inp.proximity.rear = 500;
        let (out, rpt) = zm.proc(&inp).unwrap();

        assert_eq!(rpt.phase, ZonePhaseId::DropRelease);
        assert_eq!(out.motion, MotionCmd::stop());
        assert!(DT < zm.params.drop.reverse_timeout_s);
    }

    #[test]
    fn test_rear_without_contact_keeps_reversing() {
        // Zero means no reading, at or above the threshold the zone is still further away
        for rear in [0, 700, 900].iter().copied() {
            let mut zm = ZoneMgr::default();
            zm.phase = ZonePhase::DropReverse(DropReverse::new(0.0));

            let mut inp = input(DT);
            inp.proximity.rear = rear;
            let (out, rpt) = zm.proc(&inp).unwrap();

            assert_eq!(rpt.phase, ZonePhaseId::DropReverse);
            assert_eq!(
                out.motion,
                MotionCmd::new(0.0, -zm.params.drop.reverse_speed, 0.0)
            );
        }

        // Without contact only the timeout ends the reverse
        let mut zm = ZoneMgr::default();
        zm.phase = ZonePhase::DropReverse(DropReverse::new(0.0));
        let timeout_s = zm.params.drop.reverse_timeout_s;

        let (_, rpt) = zm.proc(&input(timeout_s - DT)).unwrap();
        assert_eq!(rpt.phase, ZonePhaseId::DropReverse);
        let (_, rpt) = zm.proc(&input(timeout_s + DT)).unwrap();
        assert_eq!(rpt.phase, ZonePhaseId::DropRelease);
    }
}
