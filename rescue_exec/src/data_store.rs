//! # Data Store

use comms_if::tc::Mode;
use log::{info, warn};
use serde::Serialize;

use crate::scheduler::TickReport;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-execution scratch data of the control core.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Mode tracking
    /// Mode seen on the previous tick, `None` before the first tick
    pub last_mode: Option<Mode>,

    /// True if the previous tick ran with stale telemetry
    pub degraded: bool,

    /// Last tick's report
    pub last_report: Option<TickReport>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of cycle overruns
    pub num_cycle_overruns: u64,
}

/// Summary of an execution, saved into the session at shutdown.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSummary {
    pub num_cycles: u64,
    pub num_cycle_overruns: u64,
    pub final_report: Option<TickReport>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Increments the cycle counter and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u64).max(1);

        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;
        self.num_cycles += 1;
    }

    /// Record the mode seen on this tick, returning the previous mode if it changed.
    ///
    /// The very first tick counts as a change from no mode (`Some(None)`).
    pub fn update_mode(&mut self, mode: Mode) -> Option<Option<Mode>> {
        if self.last_mode == Some(mode) {
            return None;
        }

        let prev = self.last_mode.replace(mode);
        match prev {
            Some(p) => info!("Mode change: {} -> {}", p, mode),
            None => info!("Initial mode: {}", mode),
        }

        Some(prev)
    }

    /// Record whether this tick is degraded, logging on the edges only.
    pub fn update_degraded(&mut self, degraded: bool) {
        if degraded != self.degraded {
            if degraded {
                warn!("Telemetry stale, forward speed reduced");
            } else {
                info!("Telemetry fresh again");
            }
        }
        self.degraded = degraded;
    }

    /// Record the outcome of the cycle timing.
    pub fn cycle_end(&mut self, overrun_s: Option<f64>) {
        match overrun_s {
            Some(o) => {
                warn!("Cycle overran by {:.06} s", o);
                self.num_consec_cycle_overruns += 1;
                self.num_cycle_overruns += 1;
            }
            None => self.num_consec_cycle_overruns = 0,
        }
    }

    pub fn summary(&self) -> MissionSummary {
        MissionSummary {
            num_cycles: self.num_cycles,
            num_cycle_overruns: self.num_cycle_overruns,
            final_report: self.last_report.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1_hz_flag() {
        let mut ds = DataStore::default();
        let mut flags = vec![];
        for _ in 0..101 {
            ds.cycle_start(50.0);
            flags.push(ds.is_1_hz_cycle);
        }

        assert_eq!(ds.num_cycles, 101);
        assert_eq!(flags.iter().filter(|f| **f).count(), 3);
        assert!(flags[0] && flags[50] && flags[100]);
    }

    #[test]
    fn test_mode_changes_only_on_edges() {
        let mut ds = DataStore::default();
        assert_eq!(ds.update_mode(Mode::FollowLine), Some(None));
        assert_eq!(ds.update_mode(Mode::FollowLine), None);
        assert_eq!(ds.update_mode(Mode::Zone), Some(Some(Mode::FollowLine)));
        assert_eq!(ds.update_mode(Mode::Zone), None);
    }

    #[test]
    fn test_overrun_counters() {
        let mut ds = DataStore::default();
        ds.cycle_end(Some(0.001));
        ds.cycle_end(Some(0.002));
        assert_eq!(ds.num_consec_cycle_overruns, 2);
        ds.cycle_end(None);
        assert_eq!(ds.num_consec_cycle_overruns, 0);
        assert_eq!(ds.summary().num_cycle_overruns, 2);
    }
}
