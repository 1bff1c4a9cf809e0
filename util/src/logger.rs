//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Most verbose level written to the console.
pub const CONSOLE_MAX_LEVEL: LevelFilter = LevelFilter::Info;

/// Targets which log every command they send and are never traced.
pub const QUIET_TARGETS: [&str; 1] = ["rescue_lib::mcu_link"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// The session log file receives every record down to `min_level`. The console only shows
/// [`CONSOLE_MAX_LEVEL`] and above, a 50 Hz control tick tracing to a terminal is unreadable.
///
/// # Notes
///
/// - `min_level` must be `Info` or more verbose, the state transitions of the control core are
///   logged at `Info` and must never be filtered out.
/// - Targets listed in [`QUIET_TARGETS`] are capped at `Debug`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .level(min_level.min(CONSOLE_MAX_LEVEL))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new().level(min_level).chain(log_file);

    let mut root = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_to_str(record.level()),
                RecordBody(record, message)
            ))
        })
        .level(min_level);

    for target in QUIET_TARGETS.iter() {
        root = root.level_for(*target, min_level.min(LevelFilter::Debug));
    }

    root.chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?} (console {:?})", min_level, min_level.min(CONSOLE_MAX_LEVEL));
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

/// Message of a record, prefixed with its target for debug and trace records only.
struct RecordBody<'a>(&'a log::Record<'a>, &'a std::fmt::Arguments<'a>);

impl std::fmt::Display for RecordBody<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.level() > log::Level::Info {
            write!(f, "{}: {}", self.0.target(), self.1)
        } else {
            write!(f, "{}", self.1)
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(record: &log::Record) -> String {
        RecordBody(record, record.args()).to_string()
    }

    #[test]
    fn test_record_body() {
        assert_eq!(
            body_of(
                &log::Record::builder()
                    .level(log::Level::Debug)
                    .target("rescue_lib::turn_ctrl")
                    .args(format_args!("turn opened"))
                    .build()
            ),
            "rescue_lib::turn_ctrl: turn opened"
        );
        assert_eq!(
            body_of(
                &log::Record::builder()
                    .level(log::Level::Info)
                    .target("rescue_lib::turn_ctrl")
                    .args(format_args!("turn opened"))
                    .build()
            ),
            "turn opened"
        );
    }
}
