//! Snapshots of the perception and telemetry fields, taken once at the top of each control tick

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    mcu::{Orientation, Proximity},
    vision::{ExitSignal, LineSignal, VictimDetection, ZoneMarkers},
};
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A value together with the time it was last updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stamped<T> {
    pub value: T,

    /// Clock time of the last update, `None` if the producer never wrote it.
    pub stamp_s: Option<f64>,
}

/// The control tick's copy of every perception field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerceptionSnapshot {
    pub line: LineSignal,
    pub exit: ExitSignal,
    pub victim: VictimDetection,
    pub zone_markers: ZoneMarkers,
}

/// The control tick's copy of the telemetry fields.
///
/// Consumers must check staleness before trusting the orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub orientation: Stamped<Orientation>,
    pub proximity: Stamped<Proximity>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Stamped<T> {
    pub fn new(value: T, stamp_s: f64) -> Self {
        Self {
            value,
            stamp_s: Some(stamp_s),
        }
    }

    /// Seconds since the last update, `None` if never updated.
    pub fn age_s(&self, now_s: f64) -> Option<f64> {
        self.stamp_s.map(|s| now_s - s)
    }

    /// True if the value was updated no more than `timeout_s` ago.
    pub fn is_fresh(&self, now_s: f64, timeout_s: f64) -> bool {
        match self.age_s(now_s) {
            Some(age) => age <= timeout_s,
            None => false,
        }
    }
}

impl TelemetrySnapshot {
    /// True if the orientation can be trusted.
    pub fn is_fresh(&self, now_s: f64, timeout_s: f64) -> bool {
        self.orientation.is_fresh(now_s, timeout_s)
    }

    /// The orientation if it is fresh, otherwise `None`.
    pub fn fresh_orientation(&self, now_s: f64, timeout_s: f64) -> Option<Orientation> {
        if self.is_fresh(now_s, timeout_s) {
            Some(self.orientation.value)
        } else {
            None
        }
    }

    /// True if either front proximity sensor reads above the block threshold.
    ///
    /// Proximity staleness is not considered, a stale reading keeps blocking until the
    /// sensor says otherwise.
    pub fn is_front_blocked(&self, threshold: i32) -> bool {
        let p = self.proximity.value;
        p.front_left > threshold || p.front_right > threshold
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness() {
        let mut t = TelemetrySnapshot::default();
        assert!(!t.is_fresh(0.0, 2.0));
        assert_eq!(t.fresh_orientation(0.0, 2.0), None);

        t.orientation = Stamped::new(
            Orientation {
                yaw_deg: 12.0,
                ..Default::default()
            },
            1.0,
        );
        assert!(t.is_fresh(3.0, 2.0));
        assert!(!t.is_fresh(3.01, 2.0));
        assert_eq!(t.fresh_orientation(2.0, 2.0).map(|o| o.yaw_deg), Some(12.0));
        assert_eq!(t.orientation.age_s(1.5), Some(0.5));
    }

    #[test]
    fn test_front_blocked() {
        let mut t = TelemetrySnapshot::default();
        assert!(!t.is_front_blocked(900));

        t.proximity.value.front_right = 901;
        assert!(t.is_front_blocked(900));

        t.proximity.value.front_right = 900;
        t.proximity.value.rear = 2000;
        assert!(!t.is_front_blocked(900));
    }
}
