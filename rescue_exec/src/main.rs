//! Main rescue robot executable entry point.
//!
//! # Architecture
//!
//! The executable is a set of threads which only talk to each other through the shared state bus:
//!
//!     - Control core (main thread): the tick scheduler, running the mode logic at a fixed period
//!     - MCU link: sends actuator demands to the microcontroller, puts its telemetry on the bus
//!     - TC source: applies telecommands from a script to the operator fields of the bus
//!
//! The vision producers run as separate processes publishing onto the bus through a
//! `VisionPort`. Until they do every perception field reads as "nothing found".
//!
//! All threads poll the terminate flag. Once it is set the core writes a zero wheel command, the
//! MCU link sends the stop command and the executable saves a summary of the mission.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
#[cfg(feature = "mcu")]
use rescue_lib::mcu_link::{LogTransport, McuLink};
use rescue_lib::{
    bus::{Bus, UiPort},
    clock::{Clock, MonotonicClock},
    scheduler::Scheduler,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which the script is polled for pending TCs.
const SCRIPT_POLL_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "rescue_exec", about = "Rescue robot control executable")]
struct Opts {
    /// Path to a TC script to execute. Without a script the robot starts line following and runs
    /// until killed.
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Override the control tick period from the parameter file.
    #[structopt(long)]
    period_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("rescue_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rescue Robot Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE BUS AND CORE ----

    let bus = Bus::new();
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());

    let mut scheduler = Scheduler::init(bus.core_port(), clock.clone(), opts.period_s)
        .wrap_err("Failed to initialise the control core")?;

    info!("Control core initialised");

    // ---- START COLLABORATORS ----

    #[cfg(feature = "mcu")]
    let mcu_handle = {
        let mut link = McuLink::new(
            LogTransport::default(),
            bus.actuator_port(),
            bus.telemetry_port(clock.clone()),
            clock.clone(),
        );
        thread::Builder::new()
            .name(String::from("mcu_link"))
            .spawn(move || link.run())
            .wrap_err("Failed to start the MCU link thread")?
    };

    let script_handle = match opts.script {
        Some(path) => {
            info!("Loading script from {:?}", path);
            let si = ScriptInterpreter::new(&path).wrap_err("Failed to load script")?;
            info!(
                "Loaded script lasting {:.2} s containing {} TCs",
                si.get_duration(),
                si.get_num_tcs()
            );

            let ui = bus.ui_port();
            let script_clock = clock.clone();
            Some(
                thread::Builder::new()
                    .name(String::from("tc_script"))
                    .spawn(move || run_script(si, ui, script_clock))
                    .wrap_err("Failed to start the script thread")?,
            )
        }
        None => {
            info!("No script provided, line following until killed");
            None
        }
    };

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let summary = scheduler.run();

    // ---- SHUTDOWN ----

    if let Some(h) = script_handle {
        if h.join().is_err() {
            warn!("Script thread panicked");
        }
    }
    #[cfg(feature = "mcu")]
    {
        if mcu_handle.join().is_err() {
            warn!("MCU link thread panicked");
        }
    }

    info!(
        "Mission complete after {} cycles ({} overruns)",
        summary.num_cycles, summary.num_cycle_overruns
    );
    session.save("mission_summary.json", summary);

    session.exit();

    Ok(())
}

/// Feed the script's TCs onto the bus as they fall due, terminating at the end of the script.
fn run_script(mut si: ScriptInterpreter, ui: UiPort, clock: Arc<dyn Clock>) {
    while !ui.terminate_requested() {
        match si.get_pending_tcs(clock.now_s()) {
            PendingTcs::None => (),
            PendingTcs::Some(tcs) => {
                for tc in tcs.iter() {
                    tc_processor::exec(&ui, tc);
                }
            }
            PendingTcs::EndOfScript => {
                info!("End of script reached");
                ui.terminate();
                return;
            }
        }

        thread::sleep(SCRIPT_POLL_PERIOD);
    }
}
