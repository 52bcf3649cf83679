//! # am550-rs - Decoding AM550 Smart Meter Frames
//!
//! The Iskraemeco AM550 pushes an encrypted DLMS frame over its customer
//! interface once per second. This crate turns that byte stream into the
//! meter's eight energy and power registers:
//!
//! - Assemble frames from the serial stream using the inter-frame silence
//! - Validate HDLC markers, the length byte and the CRC-16/X-25 FCS
//! - Decrypt the payload with AES-128-CTR using the frame's system title and
//!   invocation counter
//! - Read the eight big-endian registers and scale them for publication
//! - Publish through a [`Sink`], optionally suppressing unchanged values
//!
//! ## Usage
//!
//! ```rust
//! use am550_rs::{AesKey, Am550Meter, FrameBuilder, MemorySink, RawRegisters};
//!
//! let key = AesKey::from_hex("000102030405060708090A0B0C0D0E0F").unwrap();
//! let registers = RawRegisters { active_power_pos: 1200, ..Default::default() };
//! let frame = FrameBuilder::new().build(&key, &registers).unwrap();
//!
//! let meter = Am550Meter::new(key);
//! let reading = meter.decode_frame(frame).unwrap();
//! assert_eq!(reading.active_power_pos, 1200.0);
//!
//! let mut sink = MemorySink::new();
//! reading.publish(&mut sink);
//! assert_eq!(sink.len(), 12);
//! ```

pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod frame;
pub mod logging;
pub mod meter;
pub mod payload;
pub mod serial;
pub mod sink;
pub mod util;

/// Crate version, reported by `dump_config`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::config::{MeterConfig, SerialConfig};
pub use crate::crypto::{AesKey, DecryptedPayload, Decryptor};
pub use crate::error::{
    Am550Error, CrcError, DecryptionError, ExtractionError, FrameError, FramingError,
    ModelWarning,
};
pub use crate::frame::{validate, FrameAssembler, FrameBuilder, ValidFrame};
pub use crate::logging::{init_logger, log_info};
pub use crate::meter::{Am550Meter, ByteSource, MeterStats};
pub use crate::payload::{extract, map, MeterReading, RawRegisters, Register};
pub use crate::serial::SerialRunner;
pub use crate::sink::{ChangeFilter, Channel, ChannelValue, LogSink, MemorySink, Sink};

/// Decode a single complete frame with `key`.
///
/// # Arguments
/// * `frame` - Complete frame, opening flag to closing flag
/// * `key` - The meter's 16-byte key
///
/// # Returns
/// * `Ok(MeterReading)` - Decoded reading
/// * `Err(Am550Error)` - The frame was rejected
pub fn decode_frame(frame: &[u8], key: &AesKey) -> Result<MeterReading, Am550Error> {
    let frame = validate(bytes::Bytes::copy_from_slice(frame))?;
    let payload = Decryptor::new(key.clone()).decrypt(&frame)?;
    let registers = extract(&payload)?;
    Ok(map(&registers))
}
