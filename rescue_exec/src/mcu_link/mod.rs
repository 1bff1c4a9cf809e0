//! # Microcontroller link
//!
//! Carries actuator demands from the bus to the motor/sensor microcontroller and its telemetry
//! back onto the bus. The link runs in its own thread at a faster rate than the control tick and
//! only ever talks to the core through the bus, so a slow or broken transport can't stall a tick.
//!
//! Commands are emitted as follows:
//! - `Motors` whenever the wheel demand changes, and at least every [`MOTOR_RESEND_PERIOD_S`] so
//!   the microcontroller's own watchdog keeps the wheels enabled,
//! - `Light` whenever the light demand changes,
//! - `ServoPreset` once per preset set on the bus, retried until the transport accepts it,
//! - `Stop` exactly once, on shutdown.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod transport;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub use transport::*;

use crate::{
    bus::{ActuatorPort, TelemetryPort},
    clock::Clock,
};
use comms_if::eqpt::mcu::{McuCmd, McuTelem, NUM_WHEELS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum time between two motor commands.
///
/// Units: seconds
pub const MOTOR_RESEND_PERIOD_S: f64 = 0.03;

/// Period of the link thread.
pub const LINK_PERIOD: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct McuLink<T: McuTransport> {
    transport: T,

    actuator: ActuatorPort,
    telemetry: TelemetryPort,

    clock: Arc<dyn Clock>,

    /// Last motor demand accepted by the transport, and when
    last_motors: Option<([i32; NUM_WHEELS], f64)>,

    last_light: Option<bool>,

    /// Preset taken from the bus but not yet accepted by the transport
    pending_servo: Option<u8>,

    link_ok: bool,

    stopped: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum McuLinkError {
    #[error("Could not send the command: {0}")]
    SendFailed(String),

    #[error("Could not receive telemetry: {0}")]
    RecvFailed(String),

    #[error("Could not serialize the command: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: McuTransport> McuLink<T> {
    pub fn new(
        transport: T,
        actuator: ActuatorPort,
        telemetry: TelemetryPort,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            actuator,
            telemetry,
            clock,
            last_motors: None,
            last_light: None,
            pending_servo: None,
            link_ok: true,
            stopped: false,
        }
    }

    /// Service the link until terminate is requested, then send the stop command.
    pub fn run(&mut self) {
        info!("MCU link running");

        while !self.actuator.terminate_requested() {
            self.service();
            thread::sleep(LINK_PERIOD);
        }

        self.shutdown();
    }

    /// Perform one pass of the link: drain telemetry, then send any due commands.
    pub fn service(&mut self) {
        loop {
            match self.transport.recv() {
                Ok(Some(telem)) => self.apply_telem(telem),
                Ok(None) => break,
                Err(e) => {
                    self.set_link_ok(false, Some(&e));
                    break;
                }
            }
        }

        let now_s = self.clock.now_s();

        // ---- MOTORS ----

        let wheels = self.actuator.wheels().0;
        let due = match self.last_motors {
            Some((last, sent_s)) => last != wheels || now_s - sent_s >= MOTOR_RESEND_PERIOD_S,
            None => true,
        };
        if due && self.send(McuCmd::Motors(wheels)) {
            self.last_motors = Some((wheels, now_s));
        }

        // ---- LIGHT ----

        let light = self.actuator.light_on();
        if self.last_light != Some(light) && self.send(McuCmd::Light(light)) {
            self.last_light = Some(light);
        }

        // ---- SERVO ----

        if self.pending_servo.is_none() {
            self.pending_servo = self.actuator.take_servo_preset();
        }
        if let Some(preset) = self.pending_servo {
            if self.send(McuCmd::ServoPreset(preset)) {
                self.pending_servo = None;
            }
        }
    }

    /// Put one telemetry message onto the bus.
    pub fn apply_telem(&self, telem: McuTelem) {
        match telem {
            McuTelem::Orientation(o) => self.telemetry.set_orientation(o),
            McuTelem::FrontProximity { left, right } => {
                self.telemetry.set_front_proximity(left, right)
            }
            McuTelem::RearProximity(rear) => self.telemetry.set_rear_proximity(rear),
        }
    }

    /// Send the stop command. Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        match self.transport.send(McuCmd::Stop) {
            Ok(()) => info!("MCU stop command sent"),
            Err(e) => warn!("Could not send the MCU stop command: {}", e),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True if the last transport operation succeeded.
    pub fn link_ok(&self) -> bool {
        self.link_ok
    }

    fn send(&mut self, cmd: McuCmd) -> bool {
        match self.transport.send(cmd) {
            Ok(()) => {
                self.set_link_ok(true, None);
                true
            }
            Err(e) => {
                self.set_link_ok(false, Some(&e));
                false
            }
        }
    }

    fn set_link_ok(&mut self, ok: bool, err: Option<&McuLinkError>) {
        if ok == self.link_ok {
            return;
        }
        self.link_ok = ok;

        match err {
            Some(e) => warn!("MCU link failing: {}", e),
            None => info!("MCU link recovered"),
        }
    }
}
