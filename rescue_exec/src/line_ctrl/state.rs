//! Implementation of the LineCtrl state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{LineCtrlError, LineCtrlParams};
use crate::mixer::MotionCmd;
use comms_if::eqpt::{
    mcu::Orientation,
    vision::{LineSignal, TurnMarker},
};
use util::{maths::ang_dist_deg, module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line following controller state.
#[derive(Debug, Default)]
pub struct LineCtrl {
    pub(crate) params: LineCtrlParams,

    /// Time the line was last seen, `None` if it has never been seen
    last_seen_s: Option<f64>,

    /// Yaw recorded the last time the line was seen with fresh orientation
    last_good_heading_deg: Option<f64>,

    report: StatusReport,
}

/// Input data to LineCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    pub now_s: f64,

    pub line: LineSignal,

    /// Orientation, only present if the telemetry is fresh.
    pub orientation: Option<Orientation>,
}

/// Status report for LineCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub mode: LineMode,

    /// Scale applied to the forward demand (1.0 when not tracking).
    pub speed_scale: f64,

    /// Seconds since the line was last seen, `None` while tracking or if never seen.
    pub lost_for_s: Option<f64>,

    /// True if a ramp changed the forward demand.
    pub on_ramp: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the controller is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineMode {
    /// The line is visible and being followed.
    Tracking,

    /// The line was lost within the grace period, rotating back to the last good heading.
    HeadingHold,

    /// The line has been lost for a short while, creeping forward assuming a gap.
    GapBridge,

    /// The line has been lost too long, stationary.
    Searching,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineMode {
    fn default() -> Self {
        LineMode::Searching
    }
}

impl State for LineCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = MotionCmd;
    type StatusReport = StatusReport;
    type ProcError = LineCtrlError;

    /// Initialise the LineCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = params::load_or_default(init_data)?;
        self.reset();
        Ok(())
    }

    /// Perform cyclic processing of the line controller.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input_data.now_s.is_finite() {
            return Err(LineCtrlError::NonFiniteTime(input_data.now_s));
        }
        if !input_data.line.lateral_error.is_finite() {
            return Err(LineCtrlError::NonFiniteError(input_data.line.lateral_error));
        }

        let prev_mode = self.report.mode;
        self.report = StatusReport::default();

        let cmd = if input_data.line.found {
            self.track(input_data)
        } else {
            self.lost(input_data)
        };

        if self.report.mode != prev_mode {
            debug!(
                "LineCtrl mode change: {:?} -> {:?} (line lost for {:?} s)",
                prev_mode, self.report.mode, self.report.lost_for_s
            );
        }

        trace!("LineCtrl output: {:?}, report: {:?}", cmd, self.report);

        Ok((cmd, self.report))
    }

    fn reset(&mut self) {
        self.last_seen_s = None;
        self.last_good_heading_deg = None;
        self.report = StatusReport::default();
    }
}

impl LineCtrl {
    /// Create a new controller with the given parameters.
    pub fn with_params(params: LineCtrlParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn last_good_heading_deg(&self) -> Option<f64> {
        self.last_good_heading_deg
    }

    /// Take over after a completed turn.
    ///
    /// The heading reached by the turn becomes the one to hold and the lost timer restarts, so a
    /// line not yet in view is bridged along the new heading.
    pub fn resume_after_turn(&mut self, now_s: f64, orientation: Option<Orientation>) {
        self.last_seen_s = Some(now_s);
        self.last_good_heading_deg = orientation.map(|o| o.yaw_deg);
    }

    /// Line visible: steer onto it, slowing down on sharp error.
    fn track(&mut self, input: &InputData) -> MotionCmd {
        let err = input.line.lateral_error;

        self.last_seen_s = Some(input.now_s);
        if let Some(o) = input.orientation {
            self.last_good_heading_deg = Some(o.yaw_deg);
        }

        let angular = -err * self.params.steering_gain + self.marker_bias(input.line.turn_marker);

        let scale = speed_scale(err, self.params.turn_speed_gain, self.params.floor_scale);

        // Ramps override the base speed, only trusted with fresh orientation
        let mut base_forward = self.params.base_forward;
        if let Some(o) = input.orientation {
            if o.pitch_deg > self.params.ramp_up_pitch_deg {
                base_forward = self.params.ramp_up_speed;
                self.report.on_ramp = true;
            } else if o.pitch_deg < self.params.ramp_down_pitch_deg {
                base_forward = self.params.ramp_down_speed;
                self.report.on_ramp = true;
            }
        }

        self.report.mode = LineMode::Tracking;
        self.report.speed_scale = scale;

        MotionCmd::new(self.params.base_lateral, base_forward * scale, angular)
    }

    /// Line not visible: hold heading, bridge a short gap, then stop and wait.
    fn lost(&mut self, input: &InputData) -> MotionCmd {
        // A line which has never been seen counts as lost forever
        let lost_for_s = self.last_seen_s.map(|t| input.now_s - t);

        // No blind spinning without orientation feedback
        let angular = match (input.orientation, self.last_good_heading_deg) {
            (Some(o), Some(hold_deg)) => {
                ang_dist_deg(o.yaw_deg, hold_deg) / 90.0 * self.params.heading_hold_gain
            }
            _ => 0.0,
        };

        let (mode, forward) = match lost_for_s {
            Some(t) if t <= self.params.gap_grace_s => (LineMode::HeadingHold, 0.0),
            Some(t) if t <= self.params.gap_timeout_s => (LineMode::GapBridge, self.params.gap_speed),
            _ => (LineMode::Searching, 0.0),
        };

        self.report.mode = mode;
        self.report.speed_scale = 1.0;
        self.report.lost_for_s = lost_for_s;

        MotionCmd::new(0.0, forward, angular)
    }

    fn marker_bias(&self, marker: TurnMarker) -> f64 {
        match marker {
            TurnMarker::Left => self.params.marker_bias,
            TurnMarker::Right => -self.params.marker_bias,
            // The full manoeuvre is left to the turn handler
            TurnMarker::AboutFace | TurnMarker::Straight => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Forward speed scale for a given lateral error, `max(floor, 1 - |error| * gain)`.
pub fn speed_scale(lateral_error: f64, turn_speed_gain: f64, floor_scale: f64) -> f64 {
    (1.0 - lateral_error.abs() * turn_speed_gain).max(floor_scale)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn found(err: f64, marker: TurnMarker) -> LineSignal {
        LineSignal {
            found: true,
            lateral_error: err,
            turn_marker: marker,
        }
    }

    fn yaw(yaw_deg: f64) -> Option<Orientation> {
        Some(Orientation {
            yaw_deg,
            ..Default::default()
        })
    }

    #[test]
    fn test_centred_line() {
        let mut lc = LineCtrl::default();
        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.0,
                line: found(0.0, TurnMarker::Straight),
                orientation: yaw(0.0),
            })
            .unwrap();

        assert_eq!(cmd.angular, 0.0);
        assert_eq!(rpt.speed_scale, 1.0);
        assert!((cmd.forward - 0.35).abs() < 1e-12);
        assert_eq!(rpt.mode, LineMode::Tracking);
    }

    #[test]
    fn test_centred_line_with_marker_gives_bias_only() {
        let mut lc = LineCtrl::default();
        let bias = lc.params.marker_bias;

        let (cmd, _) = lc
            .proc(&InputData {
                now_s: 0.0,
                line: found(0.0, TurnMarker::Left),
                orientation: None,
            })
            .unwrap();
        assert_eq!(cmd.angular, bias);

        let (cmd, _) = lc
            .proc(&InputData {
                now_s: 0.02,
                line: found(0.0, TurnMarker::Right),
                orientation: None,
            })
            .unwrap();
        assert_eq!(cmd.angular, -bias);
    }

    #[test]
    fn test_speed_scale_floor() {
        let p = LineCtrlParams::default();
        assert_eq!(speed_scale(0.0, p.turn_speed_gain, p.floor_scale), 1.0);
        assert_eq!(
            speed_scale(1.0 / p.turn_speed_gain, p.turn_speed_gain, p.floor_scale),
            p.floor_scale
        );
        assert!(
            (speed_scale(-1.0, p.turn_speed_gain, p.floor_scale) - (1.0 - p.turn_speed_gain)).abs()
                < 1e-12
        );
        assert_eq!(
            speed_scale(-1.0 / p.turn_speed_gain, p.turn_speed_gain, p.floor_scale),
            p.floor_scale
        );
        assert!((speed_scale(0.5, p.turn_speed_gain, p.floor_scale) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_steers_against_error() {
        let mut lc = LineCtrl::default();
        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.0,
                line: found(0.5, TurnMarker::Straight),
                orientation: yaw(0.0),
            })
            .unwrap();

        assert!(cmd.angular < 0.0);
        assert!(rpt.speed_scale < 1.0);
        assert!(cmd.forward < lc.params.base_forward);
    }

    #[test]
    fn test_ramps_replace_base_speed() {
        let mut lc = LineCtrl::default();
        let climbing = Some(Orientation {
            pitch_deg: 15.0,
            ..Default::default()
        });

        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.0,
                line: found(0.0, TurnMarker::Straight),
                orientation: climbing,
            })
            .unwrap();
        assert!(rpt.on_ramp);
        assert!((cmd.forward - 0.2).abs() < 1e-12);

        let descending = Some(Orientation {
            pitch_deg: -15.0,
            ..Default::default()
        });
        let (cmd, _) = lc
            .proc(&InputData {
                now_s: 0.02,
                line: found(0.0, TurnMarker::Straight),
                orientation: descending,
            })
            .unwrap();
        assert!((cmd.forward - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_line_lost_escalation() {
        let mut lc = LineCtrl::default();
        let lost = LineSignal::default();

        // Seen at heading 10 degrees
        lc.proc(&InputData {
            now_s: 0.0,
            line: found(0.0, TurnMarker::Straight),
            orientation: yaw(10.0),
        })
        .unwrap();

        // Drifted to 55 degrees, rotate back (clockwise, negative)
        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.2,
                line: lost,
                orientation: yaw(55.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::HeadingHold);
        assert_eq!(cmd.forward, 0.0);
        assert!((cmd.angular - (-45.0 / 90.0 * 0.8)).abs() < 1e-12);

        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.8,
                line: lost,
                orientation: yaw(10.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::GapBridge);
        assert_eq!(cmd.forward, lc.params.gap_speed);
        assert_eq!(cmd.angular, 0.0);

        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 1.5,
                line: lost,
                orientation: yaw(10.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::Searching);
        assert_eq!(cmd.forward, 0.0);
    }

    #[test]
    fn test_no_spin_without_orientation() {
        let mut lc = LineCtrl::default();
        lc.proc(&InputData {
            now_s: 0.0,
            line: found(0.0, TurnMarker::Straight),
            orientation: yaw(0.0),
        })
        .unwrap();

        let (cmd, _) = lc
            .proc(&InputData {
                now_s: 0.1,
                line: LineSignal::default(),
                orientation: None,
            })
            .unwrap();
        assert_eq!(cmd.angular, 0.0);
    }

    #[test]
    fn test_never_seen_line_is_searching() {
        let mut lc = LineCtrl::default();
        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 0.5,
                line: LineSignal::default(),
                orientation: yaw(0.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::Searching);
        assert_eq!(cmd, MotionCmd::stop());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut lc = LineCtrl::default();
        assert!(matches!(
            lc.proc(&InputData {
                now_s: 0.0,
                line: found(f64::NAN, TurnMarker::Straight),
                orientation: None,
            }),
            Err(LineCtrlError::NonFiniteError(_))
        ));
    }

    #[test]
    fn test_init_without_param_file_uses_defaults() {
        let mut lc = LineCtrl::default();
        lc.init("no_such_line_ctrl.toml").unwrap();
        assert_eq!(lc.params.gap_speed, LineCtrlParams::default().gap_speed);
        assert_eq!(lc.last_good_heading_deg(), None);
    }

    #[test]
    fn test_gap_after_turn_bridged_on_new_heading() {
        let mut lc = LineCtrl::default();
        lc.proc(&InputData {
            now_s: 0.0,
            line: found(0.0, TurnMarker::Left),
            orientation: yaw(0.0),
        })
        .unwrap();
        assert_eq!(lc.last_good_heading_deg(), Some(0.0));

        lc.resume_after_turn(1.0, yaw(84.0));
        assert_eq!(lc.last_good_heading_deg(), Some(84.0));

        // Inside the grace period, no rotation back to the old heading
        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 1.02,
                line: LineSignal::default(),
                orientation: yaw(84.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::HeadingHold);
        assert_eq!(cmd.angular, 0.0);

        let (cmd, rpt) = lc
            .proc(&InputData {
                now_s: 1.0 + lc.params.gap_grace_s + 0.1,
                line: LineSignal::default(),
                orientation: yaw(84.0),
            })
            .unwrap();
        assert_eq!(rpt.mode, LineMode::GapBridge);
        assert_eq!(cmd.forward, lc.params.gap_speed);
        assert_eq!(cmd.angular, 0.0);
    }
}
