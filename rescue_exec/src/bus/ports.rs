//! Single-writer ports onto the bus

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::sync::Arc;

// Internal
use super::{
    ActuatorFields, Calibration, Field, PerceptionFields, PerceptionSnapshot, Stamped,
    StatusFields, TelemetryFields, TelemetrySnapshot, UiFields,
};
use crate::{
    clock::Clock,
    mixer::{MotionCmd, WheelCmd},
    zone_mgr::{VictimCounts, ZoneTaskStatus},
};
use comms_if::{
    eqpt::{
        mcu::Orientation,
        vision::{ExitSignal, LineSignal, VictimDetection, ZoneMarkers},
    },
    tc::Mode,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Port of the vision producers.
#[derive(Debug, Clone)]
pub struct VisionPort {
    perception: PerceptionFields,
    terminate: Field<bool>,
}

/// Port of the telemetry producer. Every write is stamped with the port's clock.
#[derive(Clone)]
pub struct TelemetryPort {
    telemetry: TelemetryFields,
    clock: Arc<dyn Clock>,
    terminate: Field<bool>,
}

/// Port of the actuator transport.
#[derive(Debug, Clone)]
pub struct ActuatorPort {
    actuator: ActuatorFields,
    terminate: Field<bool>,
}

/// Port of the operator interface (UI, manual teleop device or TC script).
#[derive(Debug, Clone)]
pub struct UiPort {
    ui: UiFields,
    status: StatusFields,
    terminate: Field<bool>,
}

/// Port of the control core.
#[derive(Debug, Clone)]
pub struct CorePort {
    perception: PerceptionFields,
    telemetry: TelemetryFields,
    actuator: ActuatorFields,
    ui: UiFields,
    status: StatusFields,
    terminate: Field<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionPort {
    pub(crate) fn new(perception: PerceptionFields, terminate: Field<bool>) -> Self {
        Self {
            perception,
            terminate,
        }
    }

    pub fn set_line(&self, line: LineSignal) {
        self.perception.line.set(line.normalised());
    }

    pub fn set_exit(&self, exit: ExitSignal) {
        self.perception.exit.set(exit.normalised());
    }

    pub fn set_victim(&self, victim: VictimDetection) {
        self.perception.victim.set(victim.normalised());
    }

    pub fn set_zone_markers(&self, markers: ZoneMarkers) {
        self.perception.zone_markers.set(markers.normalised());
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.get()
    }
}

impl TelemetryPort {
    pub(crate) fn new(
        telemetry: TelemetryFields,
        clock: Arc<dyn Clock>,
        terminate: Field<bool>,
    ) -> Self {
        Self {
            telemetry,
            clock,
            terminate,
        }
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.telemetry
            .orientation
            .set(Stamped::new(orientation, self.clock.now_s()));
    }

    /// Update both front proximity readings, keeping the rear one.
    pub fn set_front_proximity(&self, left: i32, right: i32) {
        let now_s = self.clock.now_s();
        self.telemetry.proximity.update(|p| {
            p.value.front_left = left;
            p.value.front_right = right;
            p.stamp_s = Some(now_s);
        });
    }

    /// Update the rear proximity reading, keeping the front ones.
    pub fn set_rear_proximity(&self, rear: i32) {
        let now_s = self.clock.now_s();
        self.telemetry.proximity.update(|p| {
            p.value.rear = rear;
            p.stamp_s = Some(now_s);
        });
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.get()
    }
}

impl ActuatorPort {
    pub(crate) fn new(actuator: ActuatorFields, terminate: Field<bool>) -> Self {
        Self {
            actuator,
            terminate,
        }
    }

    pub fn wheels(&self) -> WheelCmd {
        self.actuator.wheels.get()
    }

    pub fn light_on(&self) -> bool {
        self.actuator.light_on.get()
    }

    /// Take the pending servo preset, clearing it so it is only executed once.
    pub fn take_servo_preset(&self) -> Option<u8> {
        self.actuator.servo_preset.update(|p| p.take())
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.get()
    }
}

impl UiPort {
    pub(crate) fn new(ui: UiFields, status: StatusFields, terminate: Field<bool>) -> Self {
        Self {
            ui,
            status,
            terminate,
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        self.ui.mode.set(mode);
    }

    pub fn set_manual(&self, cmd: MotionCmd) {
        self.ui.manual.set(cmd);
    }

    pub fn set_calibration(&self, calibration: Calibration) {
        self.ui.calibration.set(calibration);
    }

    /// Force the light on or off, or hand it back to automatic control with `None`.
    pub fn set_light_override(&self, light: Option<bool>) {
        self.ui.light_override.set(light);
    }

    /// Request the whole process group stops.
    pub fn terminate(&self) {
        info!("Terminate requested");
        self.terminate.set(true);
    }

    pub fn mode(&self) -> Mode {
        self.ui.mode.get()
    }

    pub fn status(&self) -> String {
        self.status.status.get()
    }

    pub fn zone_status(&self) -> ZoneTaskStatus {
        self.status.zone_status.get()
    }

    pub fn victim_counts(&self) -> VictimCounts {
        self.status.victim_counts.get()
    }

    pub fn degraded(&self) -> bool {
        self.status.degraded.get()
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.get()
    }
}

impl CorePort {
    pub(crate) fn new(
        perception: PerceptionFields,
        telemetry: TelemetryFields,
        actuator: ActuatorFields,
        ui: UiFields,
        status: StatusFields,
        terminate: Field<bool>,
    ) -> Self {
        Self {
            perception,
            telemetry,
            actuator,
            ui,
            status,
            terminate,
        }
    }

    // ---- READS ----

    pub fn perception(&self) -> PerceptionSnapshot {
        PerceptionSnapshot {
            line: self.perception.line.get(),
            exit: self.perception.exit.get(),
            victim: self.perception.victim.get(),
            zone_markers: self.perception.zone_markers.get(),
        }
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            orientation: self.telemetry.orientation.get(),
            proximity: self.telemetry.proximity.get(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.ui.mode.get()
    }

    pub fn manual(&self) -> MotionCmd {
        self.ui.manual.get()
    }

    pub fn calibration(&self) -> Calibration {
        self.ui.calibration.get()
    }

    pub fn light_override(&self) -> Option<bool> {
        self.ui.light_override.get()
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.get()
    }

    // ---- WRITES ----

    pub fn set_wheels(&self, wheels: WheelCmd) {
        self.actuator.wheels.set(wheels);
    }

    pub fn set_light(&self, on: bool) {
        self.actuator.light_on.set(on);
    }

    pub fn set_servo_preset(&self, preset: u8) {
        self.actuator.servo_preset.set(Some(preset));
    }

    pub fn set_status<S: Into<String>>(&self, status: S) {
        self.status.status.set(status.into());
    }

    pub fn set_zone_status(&self, zone_status: ZoneTaskStatus) {
        self.status.zone_status.set(zone_status);
    }

    pub fn set_victim_counts(&self, counts: VictimCounts) {
        self.status.victim_counts.set(counts);
    }

    pub fn set_degraded(&self, degraded: bool) {
        self.status.degraded.set(degraded);
    }

    /// Switch the top-level mode for a mission transition (silver strip found, zone exited).
    pub fn set_mission_mode(&self, mode: Mode) {
        self.ui.mode.set(mode);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::bus::Bus;
    use crate::clock::SimClock;
    use comms_if::eqpt::vision::{LineSignal, TurnMarker};
    use comms_if::tc::Mode;
    use std::sync::Arc;

    #[test]
    fn test_defaults_before_producers() {
        let bus = Bus::new();
        let core = bus.core_port();

        assert_eq!(core.mode(), Mode::FollowLine);
        assert!(!core.perception().line.found);
        assert_eq!(core.telemetry().orientation.stamp_s, None);
        assert!(!core.calibration().in_progress());
        assert!(!core.terminate_requested());
        assert!(bus.actuator_port().wheels().is_zero());
    }

    #[test]
    fn test_vision_writes_are_normalised() {
        let bus = Bus::new();
        bus.vision_port().set_line(LineSignal {
            found: true,
            lateral_error: 4.0,
            turn_marker: TurnMarker::Left,
        });

        let line = bus.core_port().perception().line;
        assert_eq!(line.lateral_error, 1.0);
        assert_eq!(line.turn_marker, TurnMarker::Left);
    }

    #[test]
    fn test_telemetry_stamped_with_clock() {
        let bus = Bus::new();
        let clock = SimClock::new(4.0);
        let telem = bus.telemetry_port(Arc::new(clock.clone()));

        telem.set_front_proximity(10, 20);
        clock.advance(1.0);
        telem.set_rear_proximity(30);

        let t = bus.core_port().telemetry();
        assert_eq!(t.proximity.value.front_left, 10);
        assert_eq!(t.proximity.value.front_right, 20);
        assert_eq!(t.proximity.value.rear, 30);
        assert_eq!(t.proximity.stamp_s, Some(5.0));
        assert_eq!(t.orientation.stamp_s, None);
    }

    #[test]
    fn test_servo_preset_is_one_shot() {
        let bus = Bus::new();
        let act = bus.actuator_port();

        bus.core_port().set_servo_preset(4);
        assert_eq!(act.take_servo_preset(), Some(4));
        assert_eq!(act.take_servo_preset(), None);
    }

    #[test]
    fn test_terminate_seen_by_all_ports() {
        let bus = Bus::new();
        let vision = bus.vision_port();
        let act = bus.actuator_port();

        bus.ui_port().terminate();

        assert!(vision.terminate_requested());
        assert!(act.terminate_requested());
        assert!(bus.core_port().terminate_requested());
    }
}
