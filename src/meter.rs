//! # AM550 Meter
//!
//! [`Am550Meter`] ties the pipeline together and is driven by periodic
//! [`Am550Meter::tick`] calls: each tick drains whatever bytes the transport
//! has, checks the idle timeout once, and if a frame is complete runs it
//! through validate → decrypt → extract → map before returning. A frame is
//! never carried over to the next tick; the buffer is empty again whether or
//! not decoding succeeded.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, info};

use crate::config::MeterConfig;
use crate::crypto::{AesKey, Decryptor};
use crate::error::Am550Error;
use crate::frame::{validate, FrameAssembler};
use crate::log_warn_throttled;
use crate::payload::{extract, map, MeterReading};
use crate::sink::Sink;
use crate::util::logging::{log_frame_compact, log_frame_hex, LogThrottle};
use crate::VERSION;

/// Rejected-frame warnings allowed per window.
const WARN_CAP: u32 = 5;
const WARN_WINDOW_MS: u64 = 60_000;

/// Byte-oriented transport polled once per tick.
pub trait ByteSource {
    /// Number of bytes that can be read without waiting.
    fn available(&self) -> usize;

    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for VecDeque<u8> {
    fn available(&self) -> usize {
        self.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl<B: ByteSource + ?Sized> ByteSource for &mut B {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }
}

/// Frame counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterStats {
    pub frames_received: u64,
    pub frames_decoded: u64,
    pub framing_errors: u64,
    pub crc_errors: u64,
    pub decryption_errors: u64,
    pub extraction_errors: u64,
}

#[derive(Debug)]
pub struct Am550Meter {
    assembler: FrameAssembler,
    decryptor: Decryptor,
    throttle: LogThrottle,
    stats: MeterStats,
}

impl Am550Meter {
    /// Meter with the default 100 ms idle timeout.
    pub fn new(key: AesKey) -> Self {
        Self::with_idle_timeout(key, FrameAssembler::default().idle_timeout())
    }

    pub fn with_idle_timeout(key: AesKey, idle_timeout: Duration) -> Self {
        Self {
            assembler: FrameAssembler::new(idle_timeout),
            decryptor: Decryptor::new(key),
            throttle: LogThrottle::new(WARN_WINDOW_MS, WARN_CAP),
            stats: MeterStats::default(),
        }
    }

    pub fn from_config(config: &MeterConfig) -> Result<Self, Am550Error> {
        config.validate()?;
        Ok(Self::with_idle_timeout(config.aes_key()?, config.idle_timeout()))
    }

    pub fn dump_config(&self) {
        info!("AM550 Smartmeter:");
        info!("  version: {VERSION}");
        info!("  idle timeout: {:?}", self.assembler.idle_timeout());
    }

    pub fn stats(&self) -> MeterStats {
        self.stats
    }

    pub fn idle_timeout(&self) -> Duration {
        self.assembler.idle_timeout()
    }

    /// Bytes waiting for the idle timeout.
    pub fn pending(&self) -> usize {
        self.assembler.len()
    }

    /// Feed one byte received at `now` without polling.
    pub fn receive(&mut self, byte: u8, now: Instant) {
        self.assembler.append(byte, now);
    }

    /// Drain `source`, then decode and publish a frame if the line has gone
    /// idle.
    ///
    /// Returns `Ok(None)` when no frame completed this tick, the reading when
    /// one was decoded and published, and the error when a completed frame
    /// was rejected. Nothing is published for a rejected frame.
    pub fn tick<B, S>(
        &mut self,
        source: &mut B,
        now: Instant,
        sink: &mut S,
    ) -> Result<Option<MeterReading>, Am550Error>
    where
        B: ByteSource + ?Sized,
        S: Sink + ?Sized,
    {
        while source.available() > 0 {
            match source.read_byte() {
                Some(byte) => self.assembler.append(byte, now),
                None => break,
            }
        }

        let Some(raw) = self.assembler.poll(now) else {
            return Ok(None);
        };
        self.stats.frames_received += 1;
        log_frame_hex("raw received data", &raw);

        match self.decode_frame(raw) {
            Ok(reading) => {
                self.stats.frames_decoded += 1;
                reading.publish(sink);
                Ok(Some(reading))
            }
            Err(err) => {
                self.record_error(&err);
                log_warn_throttled!(self.throttle, "frame discarded: {err}");
                Err(err)
            }
        }
    }

    /// Run one complete frame through the pipeline.
    pub fn decode_frame(&self, raw: impl Into<Bytes>) -> Result<MeterReading, Am550Error> {
        let raw: Bytes = raw.into();
        log_frame_compact("decoding frame", &raw);

        let frame = validate(raw)?;
        let payload = self.decryptor.decrypt(&frame)?;
        let registers = extract(&payload)?;
        debug!("registers: {registers:?}");

        Ok(map(&registers))
    }

    fn record_error(&mut self, err: &Am550Error) {
        match err {
            Am550Error::Framing(_) => self.stats.framing_errors += 1,
            Am550Error::Crc(_) => self.stats.crc_errors += 1,
            Am550Error::Decryption(_) => self.stats.decryption_errors += 1,
            Am550Error::Extraction(_) => self.stats.extraction_errors += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameBuilder;
    use crate::payload::RawRegisters;
    use crate::sink::MemorySink;

    fn key() -> AesKey {
        AesKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_tick_without_bytes_does_nothing() {
        let mut meter = Am550Meter::new(key());
        let mut source = VecDeque::<u8>::new();
        let mut sink = MemorySink::new();
        assert!(meter.tick(&mut source, Instant::now(), &mut sink).unwrap().is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_frame_decoded_after_idle_tick() {
        let registers = RawRegisters {
            active_power_pos: 230,
            ..Default::default()
        };
        let frame = FrameBuilder::new().build(&key(), &registers).unwrap();

        let mut meter = Am550Meter::new(key());
        let mut source: VecDeque<u8> = frame.into_iter().collect();
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        assert!(meter.tick(&mut source, t0, &mut sink).unwrap().is_none());
        assert_eq!(meter.pending(), 124);

        let reading = meter
            .tick(&mut source, t0 + ms(101), &mut sink)
            .unwrap()
            .expect("frame should complete");
        assert_eq!(reading.active_power_pos, 230.0);
        assert_eq!(sink.len(), 12);
        assert_eq!(meter.pending(), 0);
        assert_eq!(meter.stats().frames_decoded, 1);
    }

    #[test]
    fn test_rejected_frame_clears_buffer_and_publishes_nothing() {
        let mut meter = Am550Meter::new(key());
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        for byte in [0x00, 0x01, 0x02] {
            meter.receive(byte, t0);
        }
        let err = meter
            .tick(&mut VecDeque::<u8>::new(), t0 + ms(200), &mut sink)
            .unwrap_err();

        assert!(matches!(err, Am550Error::Framing(_)));
        assert_eq!(meter.pending(), 0);
        assert!(sink.is_empty());
        assert_eq!(meter.stats().framing_errors, 1);
    }

    #[test]
    fn test_from_config() {
        let mut config = MeterConfig::new("000102030405060708090a0b0c0d0e0f");
        config.idle_timeout_ms = 250;
        let meter = Am550Meter::from_config(&config).unwrap();
        assert_eq!(meter.idle_timeout(), ms(250));
        meter.dump_config();

        config.key = "00".into();
        assert!(matches!(
            Am550Meter::from_config(&config),
            Err(Am550Error::Config(_))
        ));
    }
}
