use tracing::{info, warn};

use crate::alarm::{AlarmCode, AlarmStateMachine};
use crate::comm_errors::CommunicationErrorTracker;
use crate::demux::{ByteStreamDemultiplexer, DemuxStats};
use crate::event::GroundEvent;
use crate::multispectral::{CommandRejection, MotorCommand, MultiSpectralSequencer};
use crate::packet::{ControlReply, TelemetryPacket};

/// Satellite status code reporting the separated-descent phase; observing
/// it sets the sequencer's one-way separation latch.
pub const STATUS_SEPARATED: u8 = 4;

/// Protocol-core orchestrator: one of these per link session.
///
/// All ingestion is single-writer and synchronous; the two state machines
/// are fed in-line from validated packets, and subscribers only ever see
/// immutable event copies. The outbound write path lives in
/// [`crate::link::LinkWriter`] and must be driven by the caller, never from
/// inside `ingest`.
#[derive(Debug, Default)]
pub struct GroundStation {
    demux: ByteStreamDemultiplexer,
    alarm: AlarmStateMachine,
    sequencer: MultiSpectralSequencer,
    comm_errors: CommunicationErrorTracker,
    closed: bool,
}

impl GroundStation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one link chunk and returns every event it produced, in
    /// order. A no-op after `close`.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<GroundEvent> {
        if self.closed {
            return Vec::new();
        }
        let demuxed = self.demux.ingest(chunk);
        let mut events = Vec::with_capacity(demuxed.len());
        for event in demuxed {
            match event {
                GroundEvent::Telemetry(packet) => {
                    events.push(GroundEvent::Telemetry(packet.clone()));
                    self.dispatch_packet(&packet, &mut events);
                }
                GroundEvent::Control(reply) => {
                    events.push(GroundEvent::Control(reply));
                    self.dispatch_control(reply, &mut events);
                }
                other => events.push(other),
            }
        }
        events
    }

    fn dispatch_packet(&mut self, packet: &TelemetryPacket, events: &mut Vec<GroundEvent>) {
        match AlarmCode::parse(packet.alarm_code()) {
            Some(code) => {
                for edge in self.alarm.apply(code) {
                    events.push(GroundEvent::Alarm(edge));
                }
            }
            None => {
                // The packet stays valid; only the annunciator update is
                // skipped.
                warn!(code = packet.alarm_code(), "unparseable alarm code");
            }
        }

        if packet.satellite_status() == Some(STATUS_SEPARATED) {
            self.latch_separation(events);
        }
    }

    fn dispatch_control(&mut self, reply: ControlReply, events: &mut Vec<GroundEvent>) {
        match reply {
            ControlReply::SeparationOccurred => self.latch_separation(events),
            ControlReply::MultiSpectralComplete => {
                if let Some(command) = self.sequencer.on_sequence_complete() {
                    info!(%command, "filter sequence complete");
                    events.push(GroundEvent::SequenceComplete { command });
                }
            }
            // Calibration acks are surfaced as-is; nothing to drive here.
            _ => {}
        }
    }

    fn latch_separation(&mut self, events: &mut Vec<GroundEvent>) {
        if !self.sequencer.separation_occurred() {
            info!("separation latched");
            self.sequencer.mark_separation();
            events.push(GroundEvent::SeparationLatched);
        }
    }

    /// Submits a 4-character multi-spectral command. On acceptance the
    /// returned motor command is what the caller should transmit.
    pub fn submit_command(
        &mut self,
        raw: &str,
        now_ms: u64,
    ) -> Result<MotorCommand, CommandRejection> {
        self.sequencer.submit(raw, now_ms)
    }

    /// Records one link I/O failure; every tenth returns a consolidated
    /// diagnostic bundle.
    pub fn record_comm_error(&mut self, now_ms: u64) -> Option<GroundEvent> {
        self.comm_errors
            .record(now_ms)
            .map(GroundEvent::Diagnostic)
    }

    /// Closes the session: processes whatever is already buffered, then
    /// refuses further ingestion. Safe to call at any time, including twice.
    pub fn close(&mut self) -> Vec<GroundEvent> {
        if self.closed {
            return Vec::new();
        }
        let remaining = self.ingest(&[]);
        self.closed = true;
        remaining
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn alarm(&self) -> &AlarmStateMachine {
        &self.alarm
    }

    pub fn sequencer(&self) -> &MultiSpectralSequencer {
        &self.sequencer
    }

    pub fn demux_stats(&self) -> DemuxStats {
        self.demux.stats()
    }

    pub fn comm_error_count(&self) -> u32 {
        self.comm_errors.error_count()
    }
}
