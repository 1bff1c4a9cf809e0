//! Tests of the microcontroller link against a recording transport.

#![cfg(feature = "mcu")]

use std::sync::Arc;

use comms_if::eqpt::mcu::{McuCmd, McuTelem, Orientation};
use rescue_lib::{
    bus::{Bus, CorePort},
    clock::SimClock,
    mcu_link::{McuLink, RecordingTransport, MOTOR_RESEND_PERIOD_S},
    mixer::WheelCmd,
};

fn rig() -> (
    McuLink<RecordingTransport>,
    RecordingTransport,
    CorePort,
    SimClock,
    Bus,
) {
    let clock = SimClock::new(0.0);
    let bus = Bus::new();
    let transport = RecordingTransport::new();

    let link = McuLink::new(
        transport.clone(),
        bus.actuator_port(),
        bus.telemetry_port(Arc::new(clock.clone())),
        Arc::new(clock.clone()),
    );

    (link, transport, bus.core_port(), clock, bus)
}

#[test]
fn test_motors_sent_on_change_and_resend() {
    let (mut link, transport, core, clock, _bus) = rig();

    link.service();
    assert_eq!(
        transport.sent(),
        vec![McuCmd::Motors([0; 4]), McuCmd::Light(false)]
    );
    transport.clear_sent();

    // Nothing changed and the resend period hasn't elapsed
    clock.advance(0.01);
    link.service();
    assert!(transport.sent().is_empty());

    // A new demand goes out straight away
    core.set_wheels(WheelCmd([10, -10, 10, -10]));
    clock.advance(0.01);
    link.service();
    assert_eq!(transport.sent(), vec![McuCmd::Motors([10, -10, 10, -10])]);
    transport.clear_sent();

    // And is repeated once the resend period elapses
    clock.advance(MOTOR_RESEND_PERIOD_S + 0.001);
    link.service();
    assert_eq!(transport.sent(), vec![McuCmd::Motors([10, -10, 10, -10])]);
}

#[test]
fn test_light_and_servo() {
    let (mut link, transport, core, clock, bus) = rig();

    link.service();
    transport.clear_sent();

    core.set_light(true);
    core.set_servo_preset(4);
    clock.advance(0.01);
    link.service();
    assert_eq!(
        transport.sent(),
        vec![McuCmd::Light(true), McuCmd::ServoPreset(4)]
    );
    transport.clear_sent();

    // The preset is one-shot
    assert_eq!(bus.actuator_port().take_servo_preset(), None);
    clock.advance(0.01);
    link.service();
    assert!(transport.sent().is_empty());
}

#[test]
fn test_failed_sends_are_retried() {
    let (mut link, transport, core, clock, _bus) = rig();

    transport.set_fail_sends(true);
    core.set_servo_preset(2);
    link.service();
    assert!(!link.link_ok());
    assert!(transport.sent().is_empty());

    transport.set_fail_sends(false);
    clock.advance(0.01);
    link.service();
    assert!(link.link_ok());
    assert_eq!(
        transport.sent(),
        vec![
            McuCmd::Motors([0; 4]),
            McuCmd::Light(false),
            McuCmd::ServoPreset(2)
        ]
    );
}

#[test]
fn test_telemetry_reaches_bus() {
    let (mut link, transport, core, clock, _bus) = rig();

    clock.set(3.0);
    transport.push_telem(McuTelem::Orientation(Orientation {
        yaw_deg: 45.0,
        pitch_deg: 2.0,
        roll_deg: 0.0,
    }));
    transport.push_telem(McuTelem::FrontProximity {
        left: 950,
        right: 10,
    });
    transport.push_telem(McuTelem::RearProximity(300));
    link.service();

    let telem = core.telemetry();
    assert_eq!(telem.orientation.value.yaw_deg, 45.0);
    assert_eq!(telem.orientation.stamp_s, Some(3.0));
    assert!(telem.is_fresh(4.0, 2.0));
    assert!(!telem.is_fresh(5.5, 2.0));
    assert_eq!(telem.proximity.value.front_left, 950);
    assert_eq!(telem.proximity.value.rear, 300);
    assert!(telem.is_front_blocked(900));
}

#[test]
fn test_stop_sent_once() {
    let (mut link, transport, _core, _clock, bus) = rig();

    bus.ui_port().terminate();
    link.run();
    link.shutdown();

    assert_eq!(transport.sent(), vec![McuCmd::Stop]);
}
