use serde::Serialize;

/// One consolidated bundle is emitted per this many I/O errors so a burst
/// of read failures does not flood the log.
pub const DIAGNOSTIC_EVERY: u32 = 10;

const PROBABLE_CAUSES: &[&str] = &[
    "radio out of range or antenna misaligned",
    "serial cable or USB adapter disconnected",
    "wrong baud rate configured on the port",
    "another application holding the port open",
];

const REMEDIES: &[&str] = &[
    "check antenna orientation and vehicle distance",
    "reseat the serial adapter and reopen the port",
    "verify the port is set to 57600 baud",
    "close other ground-software instances",
];

/// Consolidated diagnostic emitted on every tenth communication error.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticBundle {
    pub error_count: u32,
    pub last_error_ms: u64,
    pub probable_causes: &'static [&'static str],
    pub remedies: &'static [&'static str],
}

/// Monotonic I/O-failure counter. Never reset for the session.
#[derive(Debug, Default)]
pub struct CommunicationErrorTracker {
    error_count: u32,
    last_error_ms: u64,
}

impl CommunicationErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one read failure. Returns a bundle on every
    /// [`DIAGNOSTIC_EVERY`]-th error, `None` otherwise.
    pub fn record(&mut self, now_ms: u64) -> Option<DiagnosticBundle> {
        self.error_count = self.error_count.wrapping_add(1);
        self.last_error_ms = now_ms;

        if self.error_count % DIAGNOSTIC_EVERY == 0 {
            Some(DiagnosticBundle {
                error_count: self.error_count,
                last_error_ms: self.last_error_ms,
                probable_causes: PROBABLE_CAUSES,
                remedies: REMEDIES,
            })
        } else {
            None
        }
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn last_error_ms(&self) -> u64 {
        self.last_error_ms
    }
}
