//! # Telecommand processor module
//!
//! The telecommand processor applies TCs coming from any source to the operator fields of the bus.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use comms_if::tc::Tc;
use rescue_lib::{
    bus::{Calibration, UiPort},
    mixer::MotionCmd,
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub(crate) fn exec(ui: &UiPort, tc: &Tc) {
    match tc {
        Tc::SetMode(m) => {
            debug!("Recieved SetMode({}) command", m);
            ui.set_mode(*m);
        }
        Tc::Manual {
            lateral,
            forward,
            angular,
        } => ui.set_manual(MotionCmd::new(*lateral, *forward, *angular)),
        Tc::Calibrate { status, colour } => {
            info!("Calibration {:?} for colour \"{}\"", status, colour);
            ui.set_calibration(Calibration {
                status: *status,
                colour: colour.clone(),
            });
        }
        Tc::LightOverride(l) => {
            debug!("Recieved LightOverride({:?}) command", l);
            ui.set_light_override(*l);
        }
        Tc::Terminate => ui.terminate(),
    }
}
