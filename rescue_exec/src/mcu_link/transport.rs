//! Transports carrying the command vocabulary to the microcontroller

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::McuLinkError;
use comms_if::eqpt::mcu::{McuCmd, McuTelem};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A link to the microcontroller.
///
/// Implementations own the byte framing and any retry of their own. Neither method may block for
/// longer than one link period.
pub trait McuTransport {
    /// Send one command.
    fn send(&mut self, cmd: McuCmd) -> Result<(), McuLinkError>;

    /// Receive the next pending telemetry message, if any.
    fn recv(&mut self) -> Result<Option<McuTelem>, McuLinkError> {
        Ok(None)
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Transport which writes every command to the log instead of a serial port.
#[derive(Debug, Default)]
pub struct LogTransport {
    num_sent: u64,
}

/// Transport which records sent commands and replays queued telemetry.
///
/// Clones share the same record, so a test can keep one handle while the link owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    record: Arc<Mutex<Record>>,
}

#[derive(Debug, Default)]
struct Record {
    sent: Vec<McuCmd>,
    telem: VecDeque<McuTelem>,
    fail_sends: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl McuTransport for LogTransport {
    fn send(&mut self, cmd: McuCmd) -> Result<(), McuLinkError> {
        let json = serde_json::to_string(&cmd).map_err(McuLinkError::SerializationError)?;

        self.num_sent += 1;
        match cmd {
            McuCmd::Motors(_) => trace!("MCU <- {}", json),
            _ => debug!("MCU <- {}", json),
        }

        Ok(())
    }
}

impl LogTransport {
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }
}

impl McuTransport for RecordingTransport {
    fn send(&mut self, cmd: McuCmd) -> Result<(), McuLinkError> {
        let mut record = self.lock();
        if record.fail_sends {
            return Err(McuLinkError::SendFailed(format!("{:?} rejected", cmd)));
        }
        record.sent.push(cmd);
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<McuTelem>, McuLinkError> {
        Ok(self.lock().telem.pop_front())
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command sent so far, oldest first.
    pub fn sent(&self) -> Vec<McuCmd> {
        self.lock().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Queue a telemetry message to be received by the link.
    pub fn push_telem(&self, telem: McuTelem) {
        self.lock().telem.push_back(telem);
    }

    /// Make every following send fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
