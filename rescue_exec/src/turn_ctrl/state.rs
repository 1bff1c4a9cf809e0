//! Implementation of the TurnCtrl state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

// Internal
use super::{AboutFacePolicy, TurnCtrlError, TurnCtrlParams};
use crate::mixer::MotionCmd;
use comms_if::eqpt::{
    mcu::Orientation,
    vision::{LineSignal, TurnMarker},
};
use util::{maths::ang_dist_deg, module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turn handler state.
#[derive(Debug)]
pub struct TurnCtrl {
    pub(crate) params: TurnCtrlParams,

    session: Option<TurnSession>,

    /// Direction of the most recent left or right turn
    last_direction: TurnDirection,

    /// Time the last session closed, the cooldown is measured from here
    last_completed_s: Option<f64>,

    report: StatusReport,
}

/// An open turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TurnSession {
    pub kind: TurnKind,

    /// Direction of rotation, resolved when the session opens.
    pub direction: TurnDirection,

    pub start_s: f64,

    /// Yaw at the start of the turn, `None` if orientation wasn't fresh.
    pub start_yaw_deg: Option<f64>,

    pub creep_until_s: f64,
}

/// Input data to TurnCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    pub now_s: f64,

    /// Line signal, carrying the marker and used for reacquisition.
    pub line: LineSignal,

    /// Orientation, only present if the telemetry is fresh.
    pub orientation: Option<Orientation>,
}

/// Status report for TurnCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub phase: TurnPhase,

    pub kind: Option<TurnKind>,

    /// Heading change since the start of the turn, if measurable.
    pub heading_delta_deg: Option<f64>,

    /// Set on the tick a session closes.
    pub completion: Option<TurnCompletion>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnKind {
    Left,
    Right,
    AboutFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    /// Anticlockwise seen from above
    Left,

    /// Clockwise seen from above
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnPhase {
    Idle,
    Creeping,
    Turning,
}

/// Why a turn session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnCompletion {
    /// The heading change matched the expected angle.
    Orientation,

    /// Orientation unavailable, the line came back into view.
    LineReacquired,

    /// The maximum turn time elapsed.
    Timeout,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TurnCtrl {
    fn default() -> Self {
        Self::with_params(TurnCtrlParams::default())
    }
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::Idle
    }
}

impl TurnKind {
    pub fn from_marker(marker: TurnMarker) -> Option<Self> {
        match marker {
            TurnMarker::Straight => None,
            TurnMarker::Left => Some(TurnKind::Left),
            TurnMarker::Right => Some(TurnKind::Right),
            TurnMarker::AboutFace => Some(TurnKind::AboutFace),
        }
    }
}

impl TurnDirection {
    /// Sign of the angular demand for this direction.
    pub fn sign(self) -> f64 {
        match self {
            TurnDirection::Left => 1.0,
            TurnDirection::Right => -1.0,
        }
    }
}

impl State for TurnCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    /// `Some` while a session is open (it pre-empts line following), `None` when idle.
    type OutputData = Option<MotionCmd>;
    type StatusReport = StatusReport;
    type ProcError = TurnCtrlError;

    /// Initialise the TurnCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = params::load_or_default(init_data)?;
        self.last_direction = self.params.initial_last_direction;
        self.reset();
        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let now_s = input_data.now_s;
        if !now_s.is_finite() {
            return Err(TurnCtrlError::NonFiniteTime(now_s));
        }

        let prev_phase = self.report.phase;
        self.report = StatusReport::default();

        if self.session.is_none() {
            self.try_open(input_data);
        }

        let session = match self.session {
            Some(s) => s,
            None => return Ok((None, self.report)),
        };

        let elapsed_s = now_s - session.start_s;

        let (phase, mut cmd) = if now_s < session.creep_until_s {
            (TurnPhase::Creeping, MotionCmd::new(0.0, self.params.creep_speed, 0.0))
        } else {
            let rate = match session.kind {
                TurnKind::AboutFace => self.params.about_face_rate,
                _ => self.params.turn_rate,
            };
            (TurnPhase::Turning, MotionCmd::rotate(session.direction.sign() * rate))
        };

        if phase != prev_phase {
            debug!("TurnCtrl {:?} turn now {:?}", session.kind, phase);
        }

        let heading_delta_deg = match (input_data.orientation, session.start_yaw_deg) {
            (Some(o), Some(start)) if self.params.use_orientation => {
                Some(ang_dist_deg(start, o.yaw_deg) * self.params.yaw_sign)
            }
            _ => None,
        };

        self.report.phase = phase;
        self.report.kind = Some(session.kind);
        self.report.heading_delta_deg = heading_delta_deg;

        let completion = if elapsed_s > self.params.max_duration_s {
            Some(TurnCompletion::Timeout)
        } else if phase == TurnPhase::Turning && elapsed_s > self.params.min_duration_s {
            self.check_complete(&session, heading_delta_deg, &input_data.line)
        } else {
            None
        };

        if let Some(c) = completion {
            info!(
                "TurnCtrl {:?} turn complete after {:.2} s ({:?}, heading delta {:?})",
                session.kind, elapsed_s, c, heading_delta_deg
            );

            self.session = None;
            self.last_completed_s = Some(now_s);
            self.report.phase = TurnPhase::Idle;
            self.report.completion = Some(c);

            // Line following takes over from the next tick
            cmd = MotionCmd::stop();
        }

        trace!("TurnCtrl output: {:?}, report: {:?}", cmd, self.report);

        Ok((Some(cmd), self.report))
    }

    fn reset(&mut self) {
        if let Some(s) = self.session.take() {
            info!("TurnCtrl {:?} turn abandoned", s.kind);
        }
        self.last_completed_s = None;
        self.report = StatusReport::default();
    }
}

impl TurnCtrl {
    pub fn with_params(params: TurnCtrlParams) -> Self {
        Self {
            last_direction: params.initial_last_direction,
            params,
            session: None,
            last_completed_s: None,
            report: StatusReport::default(),
        }
    }

    /// True while a turn session is open.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TurnSession> {
        self.session.as_ref()
    }

    /// Phase reported on the last processed tick.
    pub fn phase(&self) -> TurnPhase {
        self.report.phase
    }

    pub fn last_direction(&self) -> TurnDirection {
        self.last_direction
    }

    /// Open a session if a turn marker is in view and the cooldown has elapsed.
    fn try_open(&mut self, input: &InputData) {
        let kind = match TurnKind::from_marker(input.line.turn_marker) {
            Some(k) => k,
            None => return,
        };

        let cooled_down = match self.last_completed_s {
            Some(t) => input.now_s - t >= self.params.cooldown_s,
            None => true,
        };
        if !cooled_down {
            return;
        }

        let direction = match kind {
            TurnKind::Left => TurnDirection::Left,
            TurnKind::Right => TurnDirection::Right,
            TurnKind::AboutFace => match self.params.about_face_policy {
                AboutFacePolicy::MirrorLast => self.last_direction,
                AboutFacePolicy::AlwaysLeft => TurnDirection::Left,
                AboutFacePolicy::AlwaysRight => TurnDirection::Right,
            },
        };

        if kind != TurnKind::AboutFace {
            self.last_direction = direction;
        }

        let session = TurnSession {
            kind,
            direction,
            start_s: input.now_s,
            start_yaw_deg: input.orientation.map(|o| o.yaw_deg),
            creep_until_s: input.now_s + self.params.creep_duration_s,
        };

        info!(
            "TurnCtrl {:?} turn opened (rotating {:?}, start yaw {:?})",
            kind, direction, session.start_yaw_deg
        );

        self.session = Some(session);
    }

    fn check_complete(
        &self,
        session: &TurnSession,
        heading_delta_deg: Option<f64>,
        line: &LineSignal,
    ) -> Option<TurnCompletion> {
        match heading_delta_deg {
            Some(delta) => {
                let target = self.params.turn_angle_deg;
                let err = match session.kind {
                    TurnKind::Left => delta - target,
                    TurnKind::Right => delta + target,
                    TurnKind::AboutFace => delta.abs() - 180.0,
                };

                if err.abs() <= self.params.angle_tolerance_deg {
                    Some(TurnCompletion::Orientation)
                } else {
                    None
                }
            }
            None => {
                if line.found && line.lateral_error.abs() < self.params.reacquire_error {
                    Some(TurnCompletion::LineReacquired)
                } else {
                    None
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.02;

    fn input(now_s: f64, marker: TurnMarker, yaw_deg: Option<f64>) -> InputData {
        InputData {
            now_s,
            line: LineSignal {
                found: false,
                lateral_error: 0.0,
                turn_marker: marker,
            },
            orientation: yaw_deg.map(|y| Orientation {
                yaw_deg: y,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_idle_without_marker() {
        let mut tc = TurnCtrl::default();
        let (out, rpt) = tc.proc(&input(0.0, TurnMarker::Straight, Some(0.0))).unwrap();
        assert_eq!(out, None);
        assert_eq!(rpt.phase, TurnPhase::Idle);
        assert!(!tc.is_active());
    }

    #[test]
    fn test_left_turn_with_orientation() {
        let mut tc = TurnCtrl::default();
        let mut phases = vec![];
        let mut yaw = 0.0;
        let mut t = 0.0;
        let mut completion = None;

        while t < 5.0 {
            let marker = if t < 0.1 {
                TurnMarker::Left
            } else {
                TurnMarker::Straight
            };

            let (out, rpt) = tc.proc(&input(t, marker, Some(yaw))).unwrap();

            if phases.last() != Some(&rpt.phase) {
                phases.push(rpt.phase);
            }

            if rpt.phase == TurnPhase::Turning {
                assert!(out.unwrap().angular > 0.0);
                // Simulated IMU advancing linearly, 150 deg/s anticlockwise
                yaw += 150.0 * DT;
            }

            if rpt.completion.is_some() {
                completion = rpt.completion;
                break;
            }

            t += DT;
        }

        assert_eq!(completion, Some(TurnCompletion::Orientation));
        assert_eq!(
            phases,
            vec![TurnPhase::Creeping, TurnPhase::Turning, TurnPhase::Idle]
        );
        assert!(!tc.is_active());
        assert_eq!(tc.last_direction(), TurnDirection::Left);
    }

    #[test]
    fn test_frozen_orientation_times_out() {
        let mut tc = TurnCtrl::default();
        let max = tc.params.max_duration_s;
        let mut t = 0.0;
        let mut turning_s = 0.0;

        tc.proc(&input(t, TurnMarker::Right, Some(30.0))).unwrap();

        loop {
            t += DT;
            let (_, rpt) = tc.proc(&input(t, TurnMarker::Straight, Some(30.0))).unwrap();

            if rpt.phase == TurnPhase::Turning {
                turning_s += DT;
            }

            if let Some(c) = rpt.completion {
                assert_eq!(c, TurnCompletion::Timeout);
                break;
            }

            assert!(t < max + 1.0, "turn never completed");
        }

        assert!(turning_s <= max);
        assert!(t <= max + DT + 1e-9);
    }

    #[test]
    fn test_line_reacquired_without_orientation() {
        let mut tc = TurnCtrl::default();
        tc.proc(&input(0.0, TurnMarker::Right, None)).unwrap();

        let mut inp = input(0.3, TurnMarker::Straight, None);
        inp.line.found = true;
        inp.line.lateral_error = 0.1;

        let (out, rpt) = tc.proc(&inp).unwrap();
        assert_eq!(rpt.completion, Some(TurnCompletion::LineReacquired));
        assert_eq!(out, Some(MotionCmd::stop()));
    }

    #[test]
    fn test_no_completion_before_min_duration() {
        let mut tc = TurnCtrl::default();
        tc.proc(&input(0.0, TurnMarker::Left, Some(0.0))).unwrap();

        // Already at the target heading, but only just turning
        let (_, rpt) = tc.proc(&input(0.22, TurnMarker::Straight, Some(90.0))).unwrap();
        assert_eq!(rpt.phase, TurnPhase::Turning);
        assert_eq!(rpt.completion, None);

        let (_, rpt) = tc.proc(&input(0.26, TurnMarker::Straight, Some(90.0))).unwrap();
        assert_eq!(rpt.completion, Some(TurnCompletion::Orientation));
    }

    #[test]
    fn test_cooldown_from_completion() {
        let mut tc = TurnCtrl::default();
        tc.proc(&input(0.0, TurnMarker::Left, Some(0.0))).unwrap();
        let (_, rpt) = tc.proc(&input(0.3, TurnMarker::Left, Some(90.0))).unwrap();
        assert!(rpt.completion.is_some());

        // Same marker still in view inside the cooldown
        let (out, _) = tc.proc(&input(0.5, TurnMarker::Left, Some(90.0))).unwrap();
        assert_eq!(out, None);

        let (out, rpt) = tc.proc(&input(1.2, TurnMarker::Left, Some(90.0))).unwrap();
        assert!(out.is_some());
        assert_eq!(rpt.phase, TurnPhase::Creeping);
    }

    #[test]
    fn test_about_face_direction_policy() {
        let mut tc = TurnCtrl::default();

        // Nothing seen yet, defaults to right
        tc.proc(&input(0.0, TurnMarker::AboutFace, None)).unwrap();
        assert_eq!(tc.session().unwrap().direction, TurnDirection::Right);
        tc.reset();

        tc.proc(&input(10.0, TurnMarker::Left, None)).unwrap();
        tc.reset();

        tc.proc(&input(20.0, TurnMarker::AboutFace, None)).unwrap();
        assert_eq!(tc.session().unwrap().direction, TurnDirection::Left);
        assert_eq!(tc.session().unwrap().kind, TurnKind::AboutFace);

        let mut p = TurnCtrlParams::default();
        p.about_face_policy = AboutFacePolicy::AlwaysRight;
        let mut tc = TurnCtrl::with_params(p);
        tc.proc(&input(0.0, TurnMarker::Left, None)).unwrap();
        tc.reset();
        tc.proc(&input(5.0, TurnMarker::AboutFace, None)).unwrap();
        assert_eq!(tc.session().unwrap().direction, TurnDirection::Right);
    }

    #[test]
    fn test_about_face_completes_at_half_turn() {
        let mut tc = TurnCtrl::default();
        tc.proc(&input(0.0, TurnMarker::AboutFace, Some(170.0))).unwrap();

        let (_, rpt) = tc.proc(&input(0.5, TurnMarker::Straight, Some(-10.0))).unwrap();
        assert_eq!(rpt.completion, Some(TurnCompletion::Orientation));
    }
}
