//! Idle-timeout frame assembly.
//!
//! The meter pushes one frame per second and then goes quiet, so a frame is
//! complete once no byte has arrived for longer than the idle timeout. The
//! assembler does not look at the bytes; anything malformed is the
//! validator's problem.

use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::DEFAULT_IDLE_TIMEOUT_MS;

/// Typical frame size, used as the initial buffer capacity.
const TYPICAL_FRAME_LEN: usize = 128;

/// Accumulates bytes until the line has been idle long enough.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: BytesMut,
    last_byte: Option<Instant>,
    idle_timeout: Duration,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS))
    }
}

impl FrameAssembler {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            buffer: BytesMut::with_capacity(TYPICAL_FRAME_LEN),
            last_byte: None,
            idle_timeout,
        }
    }

    /// Append one byte received at `now`.
    pub fn append(&mut self, byte: u8, now: Instant) {
        self.buffer.put_u8(byte);
        self.last_byte = Some(now);
    }

    /// Append a run of bytes that all arrived at `now`.
    pub fn extend(&mut self, bytes: &[u8], now: Instant) {
        if bytes.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(bytes);
        self.last_byte = Some(now);
    }

    /// Hand off the pending bytes if the line has been idle for strictly
    /// longer than the idle timeout. The assembler is empty afterwards.
    pub fn poll(&mut self, now: Instant) -> Option<Bytes> {
        let last = self.last_byte?;
        if self.buffer.is_empty() || now.saturating_duration_since(last) <= self.idle_timeout {
            return None;
        }

        self.last_byte = None;
        Some(self.buffer.split().freeze())
    }

    /// Drop any pending bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_byte = None;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}
