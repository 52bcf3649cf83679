//! Packing of encrypted frames, the inverse of the decode pipeline.
//!
//! Used by the `simulate` CLI command, tests and benchmarks to produce frames
//! a real meter would accept as its own.

use thiserror::Error;

use crate::constants::{
    EXPECTED_MODEL_ID, FRAME_FLAG, FRAME_FORMAT, FRAME_OVERHEAD, HEADER_LEN,
    INVOCATION_COUNTER_OFFSET, LENGTH_ADJUST, SYSTEM_TITLE_LEN, SYSTEM_TITLE_OFFSET,
};
use crate::crypto::{build_nonce, AesKey, Decryptor};
use crate::frame::crc::crc16_x25;
use crate::payload::{RawRegisters, MIN_PAYLOAD_LEN};

/// Ciphertext length of the frames the meter sends (124-byte frames).
pub const DEFAULT_PAYLOAD_LEN: usize = 91;

/// Largest ciphertext whose frame length still fits the length byte.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize + LENGTH_ADJUST - FRAME_OVERHEAD;

/// HDLC destination address (4 bytes), source address, control field.
const HDLC_ADDRESSING: [u8; 6] = [0x00, 0x02, 0x00, 0x23, 0x03, 0x13];
/// LLC header of a response frame.
const LLC_HEADER: [u8; 3] = [0xE6, 0xE7, 0x00];
/// general-glo-ciphering tag and system title length.
const GLO_CIPHERING: [u8; 2] = [0xDB, SYSTEM_TITLE_LEN as u8];
/// Security control byte: encryption only, suite 0.
const SECURITY_CONTROL: u8 = 0x20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("payload of {len} bytes cannot hold the registers, need at least {min}")]
    PayloadTooShort { len: usize, min: usize },

    #[error("payload of {len} bytes does not fit a frame, at most {max}")]
    PayloadTooLong { len: usize, max: usize },
}

#[derive(Debug, Clone)]
pub struct FrameBuilder {
    system_title: [u8; SYSTEM_TITLE_LEN],
    invocation_counter: u32,
    payload_len: usize,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        let mut system_title = [0u8; SYSTEM_TITLE_LEN];
        system_title[..EXPECTED_MODEL_ID.len()].copy_from_slice(&EXPECTED_MODEL_ID);
        system_title[EXPECTED_MODEL_ID.len()..].copy_from_slice(&[0x00, 0x00, 0x01]);
        Self {
            system_title,
            invocation_counter: 1,
            payload_len: DEFAULT_PAYLOAD_LEN,
        }
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_title(mut self, system_title: [u8; SYSTEM_TITLE_LEN]) -> Self {
        self.system_title = system_title;
        self
    }

    pub fn invocation_counter(mut self, invocation_counter: u32) -> Self {
        self.invocation_counter = invocation_counter;
        self
    }

    /// Ciphertext length used by [`FrameBuilder::build`].
    pub fn payload_len(mut self, payload_len: usize) -> Self {
        self.payload_len = payload_len;
        self
    }

    /// Pack `registers` into an encrypted frame.
    pub fn build(&self, key: &AesKey, registers: &RawRegisters) -> Result<Vec<u8>, BuildError> {
        let plaintext = registers
            .to_payload(self.payload_len)
            .ok_or(BuildError::PayloadTooShort {
                len: self.payload_len,
                min: MIN_PAYLOAD_LEN,
            })?;
        self.build_with_plaintext(key, &plaintext)
    }

    /// Encrypt an arbitrary plaintext into a frame with valid markers,
    /// length byte and FCS. The plaintext is not checked for payload markers.
    pub fn build_with_plaintext(&self, key: &AesKey, plaintext: &[u8]) -> Result<Vec<u8>, BuildError> {
        if plaintext.len() > MAX_PAYLOAD_LEN {
            return Err(BuildError::PayloadTooLong {
                len: plaintext.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let len = plaintext.len() + FRAME_OVERHEAD;
        let counter = self.invocation_counter.to_be_bytes();
        let mut frame = Vec::with_capacity(len);

        frame.extend_from_slice(&[FRAME_FLAG, FRAME_FORMAT, (len - LENGTH_ADJUST) as u8]);
        frame.extend_from_slice(&HDLC_ADDRESSING);
        let hcs = crc16_x25(&frame[1..]).to_le_bytes();
        frame.extend_from_slice(&hcs);
        frame.extend_from_slice(&LLC_HEADER);
        frame.extend_from_slice(&GLO_CIPHERING);
        debug_assert_eq!(frame.len(), SYSTEM_TITLE_OFFSET);

        frame.extend_from_slice(&self.system_title);
        // security control + invocation counter + ciphertext
        frame.push((plaintext.len() + 1 + counter.len()) as u8);
        frame.push(SECURITY_CONTROL);
        debug_assert_eq!(frame.len(), INVOCATION_COUNTER_OFFSET);
        frame.extend_from_slice(&counter);
        debug_assert_eq!(frame.len(), HEADER_LEN);

        let mut ciphertext = plaintext.to_vec();
        let nonce = build_nonce(&self.system_title, &counter);
        Decryptor::new(key.clone()).apply_keystream(&nonce, &mut ciphertext);
        frame.extend_from_slice(&ciphertext);

        let fcs = crc16_x25(&frame[1..]).to_le_bytes();
        frame.extend_from_slice(&fcs);
        frame.push(FRAME_FLAG);

        Ok(frame)
    }
}
