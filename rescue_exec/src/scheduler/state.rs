//! Implementation of the control tick scheduler

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use super::{
    ControlParams, SchedulerError, SchedulerParams, LINE_CTRL_PARAMS_FILE, MIXER_PARAMS_FILE,
    SCHEDULER_PARAMS_FILE, TURN_CTRL_PARAMS_FILE, ZONE_MGR_PARAMS_FILE,
};
use crate::{
    bus::{Bus, CorePort, PerceptionSnapshot, TelemetrySnapshot},
    clock::Clock,
    data_store::{DataStore, MissionSummary},
    line_ctrl::{self, LineCtrl},
    mixer::{Mixer, MixerParams, MotionCmd, WheelCmd},
    turn_ctrl::{self, TurnCtrl},
    zone_mgr::{self, VictimCounts, ZoneMgr, ZonePhaseId},
};
use comms_if::{eqpt::mcu::Orientation, tc::Mode};
use util::{module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control core: owns every controller and drives them from the bus once per tick.
pub struct Scheduler {
    params: SchedulerParams,

    core: CorePort,

    clock: Arc<dyn Clock>,

    mixer: Mixer,
    line_ctrl: LineCtrl,
    turn_ctrl: TurnCtrl,
    zone_mgr: ZoneMgr,

    ds: DataStore,
}

/// What a single tick did.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub now_s: f64,

    pub mode: Mode,

    /// Motion command after every override, as passed to the mixer.
    pub motion: MotionCmd,

    pub wheels: WheelCmd,

    pub light_on: Option<bool>,

    /// True if the orientation was stale on this tick.
    pub degraded: bool,

    pub blocked: bool,

    pub calibrating: bool,

    /// True on the tick that observed the terminate flag.
    pub terminated: bool,

    pub counts: VictimCounts,

    pub status: String,
}

/// Result of routing one tick through the active mode.
struct ModeOutput {
    motion: MotionCmd,
    status: String,

    /// Whether the silver strip may trigger the zone task on this tick.
    check_silver: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Scheduler {
    /// Build a new scheduler from the given parameters.
    ///
    /// Every parameter set is validated here, once running the scheduler has no failure mode.
    pub fn new(
        params: ControlParams,
        core: CorePort,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        Self::build(
            params.scheduler,
            params.mixer,
            LineCtrl::with_params(params.line_ctrl),
            TurnCtrl::with_params(params.turn_ctrl),
            ZoneMgr::with_params(params.zone_mgr),
            core,
            clock,
        )
    }

    /// Build a scheduler from the parameter files in `$RESCUE_SW_ROOT/params`, using defaults for
    /// any missing file.
    pub fn init(
        core: CorePort,
        clock: Arc<dyn Clock>,
        period_override_s: Option<f64>,
    ) -> Result<Self, SchedulerError> {
        let mut sched_params: SchedulerParams =
            params::load_or_default(SCHEDULER_PARAMS_FILE).map_err(SchedulerError::ParamLoadError)?;
        if let Some(p) = period_override_s {
            info!("Tick period overridden to {} s", p);
            sched_params.period_s = p;
        }

        let mixer_params: MixerParams =
            params::load_or_default(MIXER_PARAMS_FILE).map_err(SchedulerError::ParamLoadError)?;

        let mut line_ctrl = LineCtrl::default();
        line_ctrl
            .init(LINE_CTRL_PARAMS_FILE)
            .map_err(SchedulerError::ParamLoadError)?;
        info!("LineCtrl init complete");

        let mut turn_ctrl = TurnCtrl::default();
        turn_ctrl
            .init(TURN_CTRL_PARAMS_FILE)
            .map_err(SchedulerError::ParamLoadError)?;
        info!("TurnCtrl init complete");

        let mut zone_mgr = ZoneMgr::default();
        zone_mgr
            .init(ZONE_MGR_PARAMS_FILE)
            .map_err(SchedulerError::ParamLoadError)?;
        info!("ZoneMgr init complete");

        Self::build(
            sched_params,
            mixer_params,
            line_ctrl,
            turn_ctrl,
            zone_mgr,
            core,
            clock,
        )
    }

    /// Build a scheduler with default parameters on the given bus.
    pub fn with_defaults(bus: &Bus, clock: Arc<dyn Clock>) -> Result<Self, SchedulerError> {
        Self::new(ControlParams::default(), bus.core_port(), clock)
    }

    /// Run ticks at the configured period until terminate is requested.
    ///
    /// Always finishes by writing an all-zero wheel command.
    pub fn run(&mut self) -> MissionSummary {
        let period = Duration::from_secs_f64(self.params.period_s);

        info!("Control loop starting, period {:.3} s", self.params.period_s);

        loop {
            let cycle_start = Instant::now();

            if self.tick().terminated {
                break;
            }

            let cycle_dur = cycle_start.elapsed();
            match period.checked_sub(cycle_dur) {
                Some(sleep_dur) => {
                    self.ds.cycle_end(None);
                    thread::sleep(sleep_dur);
                }
                None => self.ds.cycle_end(Some((cycle_dur - period).as_secs_f64())),
            }
        }

        self.shutdown();
        self.ds.summary()
    }

    /// Write the final zero command.
    pub fn shutdown(&mut self) {
        self.core.set_wheels(WheelCmd::zero());
        self.core.set_status("Stopped");
        info!("Control loop stopped after {} cycles", self.ds.num_cycles);
    }

    /// Execute a single control tick.
    pub fn tick(&mut self) -> TickReport {
        let now_s = self.clock.now_s();
        self.ds.cycle_start(1.0 / self.params.period_s);

        // ---- TERMINATE ----

        if self.core.terminate_requested() {
            info!("Terminate requested, writing zero wheel command");
            self.core.set_wheels(WheelCmd::zero());

            let report = TickReport {
                terminated: true,
                status: String::from("Terminated"),
                ..self.empty_report(now_s, self.core.mode())
            };
            return self.finish(report);
        }

        // ---- MODE EDGES ----

        let mode = self.core.mode();
        if let Some(prev) = self.ds.update_mode(mode) {
            self.on_mode_change(prev, mode);
        }

        // ---- CALIBRATION FREEZE ----

        let calibration = self.core.calibration();
        if calibration.in_progress() {
            self.core.set_wheels(WheelCmd::zero());
            self.core.set_light(true);

            let status = format!("Calibrating ({})", calibration.colour);
            self.core.set_status(status.clone());

            let report = TickReport {
                light_on: Some(true),
                calibrating: true,
                status,
                ..self.empty_report(now_s, mode)
            };
            return self.finish(report);
        }

        // ---- LIGHT ----

        let light_on = match self.core.light_override() {
            Some(on) => Some(on),
            None if self.params.light_auto => Some(mode != Mode::Manual),
            None => None,
        };
        if let Some(on) = light_on {
            self.core.set_light(on);
        }

        // ---- SNAPSHOTS ----

        let perception = self.core.perception();
        let telemetry = self.core.telemetry();

        let fresh = telemetry.is_fresh(now_s, self.params.telemetry_timeout_s);
        let orientation = telemetry.fresh_orientation(now_s, self.params.telemetry_timeout_s);
        let blocked = telemetry.is_front_blocked(self.params.block_threshold);

        // ---- MODE ROUTING ----

        let mut out = match mode {
            Mode::Manual => self.manual(),
            Mode::FollowLine => self.follow_line(now_s, &perception, orientation, blocked),
            Mode::Zone => self.zone(now_s, &perception, &telemetry, blocked),
        };

        if !out.motion.is_finite() {
            warn!("Non-finite motion command {:?}, stopping", out.motion);
            out.motion = MotionCmd::stop();
        }

        // ---- STALENESS ----

        if !fresh {
            out.motion.forward *= self.params.stale_forward_factor;
            out.status.push_str(" (telemetry stale)");
        }
        self.ds.update_degraded(!fresh);

        // ---- OUTPUT ----

        let wheels = self.mixer.mix_to_wheels(&out.motion);
        self.core.set_wheels(wheels);
        self.core.set_degraded(!fresh);
        self.core.set_status(out.status.clone());

        // ---- MISSION TRIGGER ----

        if out.check_silver && perception.exit.silver_probability > self.params.silver_trigger {
            info!(
                "Silver strip detected (p = {:.2}), switching to zone task",
                perception.exit.silver_probability
            );
            self.core.set_mission_mode(Mode::Zone);
        }

        if self.ds.is_1_hz_cycle {
            debug!("[{}] {}", mode, out.status);
        }

        let report = TickReport {
            now_s,
            mode,
            motion: out.motion,
            wheels,
            light_on,
            degraded: !fresh,
            blocked,
            calibrating: false,
            terminated: false,
            counts: self.zone_mgr.counts(),
            status: out.status,
        };
        self.finish(report)
    }

    /// Phase of the zone task.
    pub fn zone_phase(&self) -> ZonePhaseId {
        self.zone_mgr.phase()
    }

    /// True while an intersection turn is in progress.
    pub fn turn_active(&self) -> bool {
        self.turn_ctrl.is_active()
    }

    pub fn victim_counts(&self) -> VictimCounts {
        self.zone_mgr.counts()
    }

    pub fn data_store(&self) -> &DataStore {
        &self.ds
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    fn on_mode_change(&mut self, prev: Option<Mode>, mode: Mode) {
        if prev == Some(Mode::FollowLine) {
            self.turn_ctrl.reset();
        }

        match mode {
            Mode::FollowLine => self.line_ctrl.reset(),
            Mode::Zone => {
                self.zone_mgr.reset();
                self.core.set_zone_status(self.zone_mgr.zone_status());
            }
            Mode::Manual => (),
        }
    }

    fn manual(&self) -> ModeOutput {
        let motion = self.core.manual();
        ModeOutput {
            motion,
            status: format!(
                "Manual: lat {:.2}, fwd {:.2}, ang {:.2}",
                motion.lateral, motion.forward, motion.angular
            ),
            check_silver: false,
        }
    }

    fn follow_line(
        &mut self,
        now_s: f64,
        perception: &PerceptionSnapshot,
        orientation: Option<Orientation>,
        blocked: bool,
    ) -> ModeOutput {
        let exit = perception.exit;
        if self.params.stop_on_exit_marker
            && exit.found
            && exit
                .angle_deg
                .map_or(true, |a| a.abs() <= self.params.exit_angle_tol_deg)
        {
            return ModeOutput {
                motion: MotionCmd::stop(),
                status: format!("Exit marker ahead (angle {:?}), stopped", exit.angle_deg),
                check_silver: false,
            };
        }

        let turn_input = turn_ctrl::InputData {
            now_s,
            line: perception.line,
            orientation,
        };
        match self.turn_ctrl.proc(&turn_input) {
            Ok((Some(motion), report)) => {
                if report.completion.is_some() {
                    self.line_ctrl.resume_after_turn(now_s, orientation);
                }

                let status = match report.kind {
                    Some(kind) => format!("Turn {:?}: {:?}", kind, report.phase),
                    None => format!("Turn: {:?}", report.phase),
                };
                return ModeOutput {
                    motion,
                    status,
                    check_silver: false,
                };
            }
            Ok((None, _)) => (),
            Err(e) => {
                warn!("Error during TurnCtrl processing: {}", e);
                return ModeOutput {
                    motion: MotionCmd::stop(),
                    status: String::from("Turn handler error, stopped"),
                    check_silver: false,
                };
            }
        }

        let line_input = line_ctrl::InputData {
            now_s,
            line: perception.line,
            orientation,
        };
        let (mut motion, report) = match self.line_ctrl.proc(&line_input) {
            Ok(o) => o,
            Err(e) => {
                warn!("Error during LineCtrl processing: {}", e);
                return ModeOutput {
                    motion: MotionCmd::stop(),
                    status: String::from("Line controller error, stopped"),
                    check_silver: false,
                };
            }
        };

        let mut status = format!(
            "Line {:?}: fwd {:.2}, ang {:.2}",
            report.mode, motion.forward, motion.angular
        );

        if blocked {
            motion = MotionCmd::stop();
            status = String::from("Path blocked, stopped");
        }

        ModeOutput {
            motion,
            status,
            check_silver: true,
        }
    }

    fn zone(
        &mut self,
        now_s: f64,
        perception: &PerceptionSnapshot,
        telemetry: &TelemetrySnapshot,
        blocked: bool,
    ) -> ModeOutput {
        let input = zone_mgr::InputData {
            now_s,
            perception: *perception,
            proximity: telemetry.proximity.value,
            blocked,
        };

        match self.zone_mgr.proc(&input) {
            Ok((out, report)) => {
                if let Some(preset) = out.servo_preset {
                    self.core.set_servo_preset(preset);
                }
                self.core.set_zone_status(report.zone_status);
                self.core.set_victim_counts(report.counts);

                if out.exit_to_line {
                    info!("Zone task complete, returning to line following");
                    self.core.set_mission_mode(Mode::FollowLine);
                }

                ModeOutput {
                    motion: out.motion,
                    status: report.status,
                    check_silver: false,
                }
            }
            Err(e) => {
                warn!("Error during ZoneMgr processing: {}", e);
                ModeOutput {
                    motion: MotionCmd::stop(),
                    status: String::from("Zone task error, stopped"),
                    check_silver: false,
                }
            }
        }
    }

    fn build(
        params: SchedulerParams,
        mixer_params: MixerParams,
        line_ctrl: LineCtrl,
        turn_ctrl: TurnCtrl,
        zone_mgr: ZoneMgr,
        core: CorePort,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        params.validate()?;
        let mixer = Mixer::new(mixer_params).map_err(SchedulerError::MixerError)?;

        Ok(Self {
            params,
            core,
            clock,
            mixer,
            line_ctrl,
            turn_ctrl,
            zone_mgr,
            ds: DataStore::default(),
        })
    }

    fn empty_report(&self, now_s: f64, mode: Mode) -> TickReport {
        TickReport {
            now_s,
            mode,
            motion: MotionCmd::stop(),
            wheels: WheelCmd::zero(),
            light_on: None,
            degraded: self.ds.degraded,
            blocked: false,
            calibrating: false,
            terminated: false,
            counts: self.zone_mgr.counts(),
            status: String::new(),
        }
    }

    fn finish(&mut self, report: TickReport) -> TickReport {
        trace!("Tick report: {:?}", report);
        self.ds.last_report = Some(report.clone());
        report
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;

    #[test]
    fn test_bad_geometry_rejected_at_construction() {
        let bus = Bus::new();
        let mut params = ControlParams::default();
        params.mixer.wheel_angles_deg[3] = params.mixer.wheel_angles_deg[0];

        let res = Scheduler::new(params, bus.core_port(), Arc::new(SimClock::default()));
        assert!(matches!(res, Err(SchedulerError::MixerError(_))));
    }

    #[test]
    fn test_mode_edges_tracked() {
        let bus = Bus::new();
        let clock = SimClock::default();
        let mut sched = Scheduler::with_defaults(&bus, Arc::new(clock.clone())).unwrap();

        sched.tick();
        assert_eq!(sched.data_store().last_mode, Some(Mode::FollowLine));

        bus.ui_port().set_mode(Mode::Manual);
        clock.advance(0.02);
        let report = sched.tick();
        assert_eq!(report.mode, Mode::Manual);
        assert_eq!(report.light_on, Some(false));
        assert_eq!(sched.data_store().num_cycles, 2);
    }

    #[test]
    fn test_init_from_param_files() {
        let bus = Bus::new();
        let clock: Arc<dyn Clock> = Arc::new(SimClock::default());

        let sched = Scheduler::init(bus.core_port(), clock.clone(), Some(0.05)).unwrap();
        assert_eq!(sched.params().period_s, 0.05);
        assert_eq!(sched.zone_phase(), ZonePhaseId::Search);
        assert!(!sched.turn_active());

        let res = Scheduler::init(bus.core_port(), clock, Some(1e20));
        assert!(matches!(res, Err(SchedulerError::InvalidPeriod(_))));
    }
}
