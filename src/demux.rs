use serde::Serialize;
use tracing::{debug, warn};

use crate::buffer::ByteBuffer;
use crate::event::GroundEvent;
use crate::frame::{decode_video_line, BinaryFrameExtractor, VIDEO_SENTINEL};
use crate::packet::{ParsedLine, TelemetryPacketValidator, PACKET_SENTINEL};

// Sniffing heuristics. All approximate by design; misclassification of a
// pathological line is an accepted trade-off, not a defect.

/// Minimum share of printable-ASCII / TAB / LF / CR bytes for the buffered
/// text candidate to be treated as text at all.
pub const PRINTABLE_RATIO_MIN_PERCENT: usize = 80;
/// Accumulated sentinel-free text beyond this is corrupted noise.
pub const RESYNC_TEXT_LIMIT: usize = 5000;
/// A line longer than this cannot be telemetry.
pub const MAX_LINE_LEN: usize = 200;
/// A line longer than this that also carries base64 padding is probable
/// binary leakage.
pub const BASE64_SUSPECT_LINE_LEN: usize = 50;
const BASE64_PAD: &str = "==";

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DemuxStats {
    pub frames_extracted: u32,
    pub packets_forwarded: u32,
    pub control_replies: u32,
    pub lines_rejected: u32,
    pub lines_dropped: u32,
    pub resyncs: u32,
    pub overflows: u32,
    pub decode_rejects: u32,
}

/// Splits the single noisy link stream into typed events.
///
/// One shared buffer feeds two interpreters: the binary frame extractor
/// runs first and splices complete frames out; the text interpreter then
/// works on the bytes up to any pending (unterminated) frame start. Every
/// byte gets at most one interpretation, and malformed input always
/// degrades to "drop and continue" - ingest never fails.
#[derive(Debug, Default)]
pub struct ByteStreamDemultiplexer {
    buffer: ByteBuffer,
    extractor: BinaryFrameExtractor,
    validator: TelemetryPacketValidator,
    stats: DemuxStats,
}

impl ByteStreamDemultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one link chunk and drains every complete frame and line it
    /// makes available.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<GroundEvent> {
        let mut events = Vec::new();
        self.buffer.append(chunk);

        // Binary path first: frames may arrive batched.
        for frame in self.extractor.extract_all(&mut self.buffer) {
            self.stats.frames_extracted += 1;
            events.push(GroundEvent::Video(frame));
        }

        self.extract_lines(&mut events);

        // Overflow guard runs last so a frame or line completed by this
        // chunk is never thrown away with the garbage.
        let buffered = self.buffer.len();
        if self.buffer.enforce_cap() {
            self.stats.overflows += 1;
            warn!(dropped_bytes = buffered, "link buffer overflow, cleared");
            events.push(GroundEvent::BufferOverflow {
                dropped_bytes: buffered,
            });
        }

        events
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn extract_lines(&mut self, events: &mut Vec<GroundEvent>) {
        // The text interpreter must not consume into a frame that has
        // started but not yet terminated.
        let text_end = self
            .extractor
            .pending_frame_start(&self.buffer)
            .unwrap_or(self.buffer.len());
        if text_end == 0 {
            return;
        }

        if !looks_like_text(&self.buffer.as_slice()[..text_end]) {
            // Binary corruption mixed into the text candidate. Skip line
            // extraction this round; the hard cap reclaims it eventually.
            self.stats.decode_rejects += 1;
            return;
        }

        let text_end = self.resync(text_end, events);

        // Split on newline; the trailing partial line stays buffered. The
        // region is copied out so consumed lines can be trimmed afterwards.
        let region = self.buffer.as_slice()[..text_end].to_vec();
        let mut consumed = 0;
        while let Some(nl) = region[consumed..].iter().position(|&b| b == b'\n') {
            let line_bytes = &region[consumed..consumed + nl];
            consumed += nl + 1;
            let line = String::from_utf8_lossy(line_bytes);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.dispatch_line(line, events);
        }
        self.buffer.consume_front(consumed);
    }

    /// Resync-to-known-marker policy over the text candidate
    /// `buffer[..text_end]`. Returns the region end after any trim. Never
    /// discards bytes at or after the earliest sentinel.
    fn resync(&mut self, text_end: usize, events: &mut Vec<GroundEvent>) -> usize {
        let region = &self.buffer.as_slice()[..text_end];
        match earliest_sentinel(region) {
            Some(0) => text_end,
            Some(pos) => {
                self.stats.resyncs += 1;
                debug!(discarded_bytes = pos, "resynchronized to sentinel");
                self.buffer.consume_front(pos);
                events.push(GroundEvent::Resync {
                    discarded_bytes: pos,
                });
                text_end - pos
            }
            None if text_end > RESYNC_TEXT_LIMIT => {
                // Sentinel-free noise past the limit: drop the whole text
                // candidate.
                self.stats.resyncs += 1;
                warn!(
                    discarded_bytes = text_end,
                    "no sentinel in oversized text buffer, discarded"
                );
                self.buffer.consume_front(text_end);
                events.push(GroundEvent::Resync {
                    discarded_bytes: text_end,
                });
                0
            }
            None => text_end,
        }
    }

    fn dispatch_line(&mut self, line: &str, events: &mut Vec<GroundEvent>) {
        if line.starts_with(VIDEO_SENTINEL) {
            match decode_video_line(line) {
                Some(frame) => {
                    self.stats.frames_extracted += 1;
                    events.push(GroundEvent::Video(frame));
                }
                None => {
                    self.stats.lines_dropped += 1;
                    debug!(len = line.len(), "dropped malformed video line");
                }
            }
            return;
        }

        // Long or base64-padded lines are binary leakage, not telemetry.
        if line.len() > MAX_LINE_LEN
            || (line.len() > BASE64_SUSPECT_LINE_LEN && line.contains(BASE64_PAD))
        {
            self.stats.lines_dropped += 1;
            debug!(len = line.len(), "dropped probable binary leakage line");
            return;
        }

        match self.validator.parse(line) {
            Ok(ParsedLine::Packet(packet)) => {
                self.stats.packets_forwarded += 1;
                events.push(GroundEvent::Telemetry(packet));
            }
            Ok(ParsedLine::Control(reply)) => {
                self.stats.control_replies += 1;
                events.push(GroundEvent::Control(reply));
            }
            Err(reason) => {
                self.stats.lines_rejected += 1;
                debug!(%reason, "rejected telemetry line");
                events.push(GroundEvent::LineRejected {
                    line: line.to_owned(),
                    reason,
                });
            }
        }
    }
}

/// NUL bytes or too few printable bytes mean binary corruption mixed into
/// the text candidate.
fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    let mut printable = 0usize;
    for &b in bytes {
        if b == 0 {
            return false;
        }
        if (0x20..=0x7E).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r' {
            printable += 1;
        }
    }
    printable * 100 >= bytes.len() * PRINTABLE_RATIO_MIN_PERCENT
}

fn earliest_sentinel(region: &[u8]) -> Option<usize> {
    let packet = region.iter().position(|&b| b == PACKET_SENTINEL as u8);
    let video = region
        .windows(VIDEO_SENTINEL.len())
        .position(|w| w == VIDEO_SENTINEL.as_bytes());
    match (packet, video) {
        (Some(p), Some(v)) => Some(p.min(v)),
        (Some(p), None) => Some(p),
        (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_sniff_ratio() {
        assert!(looks_like_text(b"$1,2,3*4A\r\n"));
        assert!(!looks_like_text(b"abc\0def"));
        assert!(!looks_like_text(&[0xDE, 0xAD, 0xBE, 0xEF, b'a']));
        assert!(looks_like_text(b""));
    }

    #[test]
    fn test_earliest_sentinel_prefers_lower_offset() {
        assert_eq!(earliest_sentinel(b"xx#VIDEO:yy$zz"), Some(2));
        assert_eq!(earliest_sentinel(b"xx$yy#VIDEO:zz"), Some(2));
        assert_eq!(earliest_sentinel(b"no marker here"), None);
    }
}
