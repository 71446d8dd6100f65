use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::buffer::ByteBuffer;

/// Binary frame delimiters on the wire: `DE AD BE EF <jpeg> CA FE BA BE`.
pub const FRAME_START_MARKER: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
pub const FRAME_END_MARKER: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Legacy text-embedded frame: a full line of the shape `#VIDEO:<base64>#`.
pub const VIDEO_SENTINEL: &str = "#VIDEO:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSource {
    Base64Text,
    RawBinary,
}

/// One complete JPEG image recovered from the downlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFrame {
    pub source: FrameSource,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl VideoFrame {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

fn find_marker(haystack: &[u8], marker: &[u8; 4], from: usize) -> Option<usize> {
    if haystack.len() < from + marker.len() {
        return None;
    }
    haystack[from..]
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|p| p + from)
}

/// Scans the shared buffer for magic-delimited JPEG frames.
///
/// Each call starts at the first unconsumed byte, so a failed search never
/// costs a later frame its bytes. A start marker with no end marker yet
/// leaves the buffer untouched; more bytes are simply awaited.
#[derive(Debug, Default)]
pub struct BinaryFrameExtractor;

impl BinaryFrameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the next complete frame, splicing its byte range (markers
    /// included) out of the buffer. Bytes before the start marker are left
    /// in place for the text interpreter.
    pub fn extract_next(&self, buffer: &mut ByteBuffer) -> Option<VideoFrame> {
        let data = buffer.as_slice();
        let start = find_marker(data, &FRAME_START_MARKER, 0)?;
        let payload_start = start + FRAME_START_MARKER.len();
        let end = find_marker(data, &FRAME_END_MARKER, payload_start)?;

        let payload = data[payload_start..end].to_vec();
        buffer.splice_out(start, end + FRAME_END_MARKER.len());

        Some(VideoFrame {
            source: FrameSource::RawBinary,
            payload,
        })
    }

    /// Drains every complete frame currently in the buffer, in arrival order.
    pub fn extract_all(&self, buffer: &mut ByteBuffer) -> Vec<VideoFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = self.extract_next(buffer) {
            frames.push(frame);
        }
        frames
    }

    /// Position of a pending (started but not yet terminated) frame, if any.
    /// The text interpreter must not consume past this point.
    pub fn pending_frame_start(&self, buffer: &ByteBuffer) -> Option<usize> {
        find_marker(buffer.as_slice(), &FRAME_START_MARKER, 0)
    }
}

/// Decodes a legacy `#VIDEO:<base64>#` line into a frame. Returns `None`
/// when the line is not a well-formed video sentinel line or the payload is
/// not valid base64; callers drop such lines and continue.
pub fn decode_video_line(line: &str) -> Option<VideoFrame> {
    let rest = line.strip_prefix(VIDEO_SENTINEL)?;
    let encoded = rest.strip_suffix('#')?;
    let payload = BASE64.decode(encoded.trim()).ok()?;
    Some(VideoFrame {
        source: FrameSource::Base64Text,
        payload,
    })
}
