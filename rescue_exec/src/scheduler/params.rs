//! Parameters structures for the scheduler

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::SchedulerError;
use crate::{
    line_ctrl::LineCtrlParams, mixer::MixerParams, turn_ctrl::TurnCtrlParams,
    zone_mgr::ZoneMgrParams,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const SCHEDULER_PARAMS_FILE: &str = "rescue_exec.toml";
pub const MIXER_PARAMS_FILE: &str = "mixer.toml";
pub const LINE_CTRL_PARAMS_FILE: &str = "line_ctrl.toml";
pub const TURN_CTRL_PARAMS_FILE: &str = "turn_ctrl.toml";
pub const ZONE_MGR_PARAMS_FILE: &str = "zone_mgr.toml";

/// Longest accepted tick period.
///
/// Units: seconds
pub const MAX_PERIOD_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the tick scheduler itself.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerParams {
    /// Target period of one tick.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Orientation older than this is stale.
    ///
    /// Units: seconds
    pub telemetry_timeout_s: f64,

    /// Front proximity reading above which the path is blocked.
    pub block_threshold: i32,

    /// Silver strip probability above which the zone task starts.
    pub silver_trigger: f64,

    /// An exit marker within this angle of straight ahead stops the robot.
    ///
    /// Units: degrees
    pub exit_angle_tol_deg: f64,

    /// Factor applied to the forward demand when telemetry is stale.
    pub stale_forward_factor: f64,

    /// Drive the light from the mode when there is no override.
    pub light_auto: bool,

    /// Stop when the exit marker is straight ahead.
    pub stop_on_exit_marker: bool,
}

/// Every parameter set of the control core.
#[derive(Debug, Clone, Default)]
pub struct ControlParams {
    pub scheduler: SchedulerParams,
    pub mixer: MixerParams,
    pub line_ctrl: LineCtrlParams,
    pub turn_ctrl: TurnCtrlParams,
    pub zone_mgr: ZoneMgrParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SchedulerParams {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(self.period_s.is_finite() && self.period_s > 0.0 && self.period_s <= MAX_PERIOD_S) {
            return Err(SchedulerError::InvalidPeriod(self.period_s));
        }
        if !(self.telemetry_timeout_s.is_finite() && self.telemetry_timeout_s > 0.0) {
            return Err(SchedulerError::InvalidTimeout(self.telemetry_timeout_s));
        }
        Ok(())
    }
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            period_s: 0.02,
            telemetry_timeout_s: 2.0,
            block_threshold: 900,
            silver_trigger: 0.08,
            exit_angle_tol_deg: 20.0,
            stale_forward_factor: 0.5,
            light_auto: true,
            stop_on_exit_marker: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn_ctrl::AboutFacePolicy;
    use util::params::from_toml_str;

    #[test]
    fn test_shipped_params_parse() {
        let scheduler: SchedulerParams =
            from_toml_str(include_str!("../../../params/rescue_exec.toml")).unwrap();
        scheduler.validate().unwrap();
        assert_eq!(scheduler.block_threshold, 900);

        let mixer: MixerParams =
            from_toml_str(include_str!("../../../params/mixer.toml")).unwrap();
        mixer.validate().unwrap();

        let line: LineCtrlParams =
            from_toml_str(include_str!("../../../params/line_ctrl.toml")).unwrap();
        assert!((line.steering_gain - LineCtrlParams::default().steering_gain).abs() < 1e-3);

        let turn: TurnCtrlParams =
            from_toml_str(include_str!("../../../params/turn_ctrl.toml")).unwrap();
        assert_eq!(turn.about_face_policy, AboutFacePolicy::MirrorLast);

        let zone: ZoneMgrParams =
            from_toml_str(include_str!("../../../params/zone_mgr.toml")).unwrap();
        assert_eq!(zone.drop.red_gate_presets, [6, 7]);
        assert_eq!(zone.quota.silver, 2);
    }

    #[test]
    fn test_invalid_period_rejected() {
        let params = SchedulerParams {
            period_s: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SchedulerError::InvalidPeriod(_))
        ));

        let params = SchedulerParams {
            period_s: 1e20,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SchedulerError::InvalidPeriod(_))
        ));

        let params = SchedulerParams {
            period_s: MAX_PERIOD_S,
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        let params = SchedulerParams {
            telemetry_timeout_s: std::f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SchedulerError::InvalidTimeout(_))
        ));
    }
}
