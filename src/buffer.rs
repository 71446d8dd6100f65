/// Hard cap on accumulated link bytes. Exceeding it clears the buffer
/// outright: availability over completeness on a noisy half-duplex link.
pub const BUFFER_HARD_CAP: usize = 10 * 1024;

/// Append-only byte accumulator shared by the text-line and binary-frame
/// interpreters. Both consume via explicit trims (front or spliced range),
/// never via independent copies.
///
/// The cap is enforced by [`ByteBuffer::enforce_cap`], called by the
/// demultiplexer after frame extraction so a frame completing in the same
/// chunk that crosses the cap is not lost.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Clears the buffer if it has grown past [`BUFFER_HARD_CAP`].
    /// Returns true if a clear happened.
    pub fn enforce_cap(&mut self) -> bool {
        if self.data.len() > BUFFER_HARD_CAP {
            self.data.clear();
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes the first `count` bytes.
    pub fn consume_front(&mut self, count: usize) {
        let count = count.min(self.data.len());
        self.data.drain(..count);
    }

    /// Removes the byte range `[start, end)`, leaving surrounding bytes in
    /// place. Used by the frame extractor to take a marker-delimited frame
    /// out of the middle of interleaved traffic.
    pub fn splice_out(&mut self, start: usize, end: usize) {
        let end = end.min(self.data.len());
        if start >= end {
            return;
        }
        self.data.drain(start..end);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
