//! Structural and FCS validation of a complete frame.
//!
//! Layout of a frame (offsets from the opening flag):
//!
//! ```text
//! [0]        7E             opening flag
//! [1]        A0             frame format
//! [2]        len - 2        length byte
//! [3..16)                   HDLC addresses, control, LLC, APDU tag (not interpreted)
//! [16..24)                  system title, starts with the model id "Khu6\x86"
//! [24..26)                  (not interpreted)
//! [26..30)                  invocation counter
//! [30..len-3)               ciphertext
//! [len-3..len-1)            FCS, CRC-16/X-25, little endian
//! [len-1]    7E             closing flag
//! ```

use bytes::Bytes;
use log::{debug, warn};

use crate::constants::{
    EXPECTED_MODEL_ID, FRAME_FLAG, INVOCATION_COUNTER_LEN, INVOCATION_COUNTER_OFFSET,
    LENGTH_ADJUST, LENGTH_OFFSET, MIN_FRAME_LEN, MODEL_ID_OFFSET, OPENING_MARKER, PAYLOAD_OFFSET,
    SYSTEM_TITLE_LEN, SYSTEM_TITLE_OFFSET, TRAILER_LEN,
};
use crate::error::{CrcError, FrameError, FramingError, ModelWarning};
use crate::frame::crc::crc16_x25;

/// A frame whose markers, length and FCS have been checked.
///
/// Only [`validate`] constructs one, so every accessor can index without
/// further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFrame {
    bytes: Bytes,
    model_warning: Option<ModelWarning>,
}

impl ValidFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn system_title(&self) -> [u8; SYSTEM_TITLE_LEN] {
        let mut title = [0u8; SYSTEM_TITLE_LEN];
        title.copy_from_slice(
            &self.bytes[SYSTEM_TITLE_OFFSET..SYSTEM_TITLE_OFFSET + SYSTEM_TITLE_LEN],
        );
        title
    }

    pub fn invocation_counter_bytes(&self) -> [u8; INVOCATION_COUNTER_LEN] {
        let mut counter = [0u8; INVOCATION_COUNTER_LEN];
        counter.copy_from_slice(
            &self.bytes[INVOCATION_COUNTER_OFFSET..INVOCATION_COUNTER_OFFSET + INVOCATION_COUNTER_LEN],
        );
        counter
    }

    pub fn invocation_counter(&self) -> u32 {
        u32::from_be_bytes(self.invocation_counter_bytes())
    }

    /// Encrypted payload, `len - 33` bytes starting at offset 30.
    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[PAYLOAD_OFFSET..self.bytes.len() - TRAILER_LEN]
    }

    pub fn model_warning(&self) -> Option<ModelWarning> {
        self.model_warning
    }
}

/// Validate a complete frame.
///
/// Checks run in a fixed order and stop at the first failure: minimum
/// length, opening marker, length byte, closing flag, FCS. An unexpected
/// model id is only logged.
pub fn validate(bytes: impl Into<Bytes>) -> Result<ValidFrame, FrameError> {
    let bytes: Bytes = bytes.into();
    let len = bytes.len();

    if len < MIN_FRAME_LEN {
        return Err(FramingError::TooShort {
            len,
            min: MIN_FRAME_LEN,
        }
        .into());
    }

    if bytes[..2] != OPENING_MARKER {
        return Err(FramingError::BadOpeningMarker {
            found0: bytes[0],
            found1: bytes[1],
        }
        .into());
    }

    let declared = bytes[LENGTH_OFFSET] as usize + LENGTH_ADJUST;
    if len != declared {
        return Err(FramingError::LengthMismatch {
            actual: len,
            declared,
        }
        .into());
    }

    if bytes[len - 1] != FRAME_FLAG {
        return Err(FramingError::BadClosingMarker {
            found: bytes[len - 1],
        }
        .into());
    }

    let calculated = crc16_x25(&bytes[1..len - TRAILER_LEN]);
    let expected = u16::from_le_bytes([bytes[len - 3], bytes[len - 2]]);
    if calculated != expected {
        return Err(CrcError::Mismatch {
            calculated,
            expected,
        }
        .into());
    }
    debug!("frame of {len} bytes passed validation, fcs {expected:04x}");

    let model_warning = check_model(&bytes);
    if let Some(warning) = model_warning {
        warn!("{warning}");
    }

    Ok(ValidFrame {
        bytes,
        model_warning,
    })
}

fn check_model(bytes: &[u8]) -> Option<ModelWarning> {
    let mut found = [0u8; 5];
    found.copy_from_slice(&bytes[MODEL_ID_OFFSET..MODEL_ID_OFFSET + EXPECTED_MODEL_ID.len()]);
    (found != EXPECTED_MODEL_ID).then_some(ModelWarning { found })
}
