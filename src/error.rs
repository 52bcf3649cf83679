//! # AM550 Error Handling
//!
//! This module defines the error taxonomy of the frame pipeline and the
//! crate-level [`Am550Error`] that wraps every failure the crate can report.
//!
//! Every pipeline error aborts processing of the current frame; no partial
//! reading is produced. [`ModelWarning`] is the only non-fatal signal.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::KeyError;
use crate::frame::BuildError;
use crate::payload::Register;
use crate::util::hex::HexError;

/// Structural problems found before the checksum is looked at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// Buffer cannot hold the fixed header and trailer fields.
    #[error("frame too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// First two bytes are not `7E A0`.
    #[error("wrong opening bytes: {found0:02x} {found1:02x}, expected 7e a0")]
    BadOpeningMarker { found0: u8, found1: u8 },

    /// Buffer length disagrees with the length byte.
    #[error("wrong frame length: {actual}, expected {declared}")]
    LengthMismatch { actual: usize, declared: usize },

    /// Last byte is not the closing flag.
    #[error("wrong closing byte: {found:02x}, expected 7e")]
    BadClosingMarker { found: u8 },
}

/// Frame check sequence failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrcError {
    #[error("crc mismatch: calculated {calculated:04x}, expected {expected:04x}")]
    Mismatch { calculated: u16, expected: u16 },
}

/// Either kind of validator rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Crc(#[from] CrcError),
}

/// Raised when the decrypted payload does not carry the expected markers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// Key is probably wrong or the frame was corrupted in a way the CRC
    /// did not catch.
    #[error("decryption error, please check if your key is correct")]
    IntegrityCheckFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("register {register} at offset {offset:?} is out of bounds for a {len}-byte payload")]
    OutOfBounds {
        register: Register,
        /// `None` when the offset would be negative.
        offset: Option<usize>,
        len: usize,
    },
}

/// Informational: the model identifier in the frame is not the one this
/// crate was tested against. Processing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelWarning {
    pub found: [u8; 5],
}

impl fmt::Display for ModelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown smartmeter model {}, support is untested",
            self.found.escape_ascii()
        )
    }
}

/// Represents the different error types that can occur in the AM550 crate.
#[derive(Debug, Error)]
pub enum Am550Error {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Crc(#[from] CrcError),

    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Invalid key: {0}")]
    Key(#[from] KeyError),

    #[error("Invalid hex: {0}")]
    Hex(#[from] HexError),

    #[error("Cannot build frame: {0}")]
    Build(#[from] BuildError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FrameError> for Am550Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Framing(e) => Am550Error::Framing(e),
            FrameError::Crc(e) => Am550Error::Crc(e),
        }
    }
}

impl Am550Error {
    /// True for errors that only cost the current frame.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Am550Error::Framing(_)
                | Am550Error::Crc(_)
                | Am550Error::Decryption(_)
                | Am550Error::Extraction(_)
        )
    }
}
