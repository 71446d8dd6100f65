use serde::Serialize;

use crate::alarm::AlarmEvent;
use crate::comm_errors::DiagnosticBundle;
use crate::frame::VideoFrame;
use crate::multispectral::FilterCommand;
use crate::packet::{ControlReply, RejectReason, TelemetryPacket};

/// Everything the protocol core hands to its subscribers (chart, map and
/// video sinks live outside this crate and consume these).
#[derive(Debug, Clone, Serialize)]
pub enum GroundEvent {
    /// A checksum-valid 22-field telemetry record.
    Telemetry(TelemetryPacket),
    /// A complete JPEG frame, from either wire format.
    Video(VideoFrame),
    /// An out-of-band acknowledgement from the vehicle.
    Control(ControlReply),
    /// An edge on the 6-bit alarm bitmap.
    Alarm(AlarmEvent),
    /// A candidate line that failed validation and was dropped.
    LineRejected { line: String, reason: RejectReason },
    /// Bytes before the earliest sentinel were discarded.
    Resync { discarded_bytes: usize },
    /// The shared buffer blew past its cap and was cleared.
    BufferOverflow { dropped_bytes: usize },
    /// The separation latch was just set (fires once per session).
    SeparationLatched,
    /// The in-flight filter sequence finished.
    SequenceComplete { command: FilterCommand },
    /// Consolidated communication-error diagnostic (every 10th I/O error).
    Diagnostic(DiagnosticBundle),
}
