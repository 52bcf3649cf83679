//! # AES-128-CTR Payload Decryption
//!
//! The meter encrypts its APDU with DLMS security suite 0 in counter mode.
//! The initial counter block is built from the frame itself:
//!
//! ```text
//! nonce[0..8)   = frame[16..24)   system title
//! nonce[8..12)  = frame[26..30)   invocation counter
//! nonce[12..15) = 00 00 00
//! nonce[15]     = 02              security suite tag
//! ```
//!
//! There is no authentication tag to verify. A payload is accepted when it
//! starts with `0F` and every register is preceded by the `06` type tag;
//! anything else almost always means a wrong key.
//!
//! ```rust
//! use am550_rs::crypto::{AesKey, Decryptor};
//!
//! let key = AesKey::from_hex("00112233445566778899AABBCCDDEEFF").unwrap();
//! let decryptor = Decryptor::new(key);
//! ```

use std::fmt;
use std::ops::Deref;

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use log::{debug, trace};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    INVOCATION_COUNTER_LEN, PAYLOAD_START_MARKER, REGISTER_COUNT, REGISTER_SEPARATOR,
    REGISTER_STRIDE, SECURITY_SUITE_TAG, SYSTEM_TITLE_LEN,
};
use crate::error::DecryptionError;
use crate::frame::ValidFrame;
use crate::util::hex;
use crate::util::logging::log_frame_hex;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

pub const KEY_LEN: usize = 16;
pub const NONCE_LEN: usize = 16;

/// Key errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    #[error("expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("key must be 16 bytes in hex: {0}")]
    InvalidHex(#[from] hex::HexError),
}

/// AES-128 key, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    key: [u8; KEY_LEN],
}

impl AesKey {
    /// Create AES key from a 16-byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self { key })
    }

    /// Create AES key from hex string; spaces are allowed, case is ignored.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode_hex(hex_str)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl From<[u8; KEY_LEN]> for AesKey {
    fn from(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(**redacted**)")
    }
}

/// Build the initial counter block for a frame.
pub fn build_nonce(
    system_title: &[u8; SYSTEM_TITLE_LEN],
    invocation_counter: &[u8; INVOCATION_COUNTER_LEN],
) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..SYSTEM_TITLE_LEN].copy_from_slice(system_title);
    nonce[SYSTEM_TITLE_LEN..SYSTEM_TITLE_LEN + INVOCATION_COUNTER_LEN]
        .copy_from_slice(invocation_counter);
    nonce[NONCE_LEN - 1] = SECURITY_SUITE_TAG;
    nonce
}

/// Decrypted APDU that passed the marker check.
///
/// Only [`Decryptor::decrypt`] produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedPayload(Vec<u8>);

impl DecryptedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for DecryptedPayload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Holds the meter key and decrypts validated frames.
#[derive(Debug, Clone)]
pub struct Decryptor {
    key: AesKey,
}

impl Decryptor {
    pub fn new(key: AesKey) -> Self {
        Self { key }
    }

    /// Nonce for `frame`.
    pub fn nonce_for(frame: &ValidFrame) -> [u8; NONCE_LEN] {
        build_nonce(&frame.system_title(), &frame.invocation_counter_bytes())
    }

    /// XOR `buf` with the AES-128-CTR keystream started at `nonce`.
    ///
    /// Encryption and decryption are the same operation.
    pub fn apply_keystream(&self, nonce: &[u8; NONCE_LEN], buf: &mut [u8]) {
        let mut cipher = Aes128Ctr::new(self.key.as_bytes().into(), nonce.into());
        cipher.apply_keystream(buf);
    }

    /// Decrypt the ciphertext of `frame` and check the payload markers.
    pub fn decrypt(&self, frame: &ValidFrame) -> Result<DecryptedPayload, DecryptionError> {
        let nonce = Self::nonce_for(frame);
        trace!("decrypting {} bytes, nonce {}", frame.ciphertext().len(), hex::encode_hex(&nonce));

        let mut payload = frame.ciphertext().to_vec();
        self.apply_keystream(&nonce, &mut payload);
        log_frame_hex("decrypted data", &payload);

        if !has_payload_markers(&payload) {
            debug!(
                "payload markers missing: first byte {:02x?}, {} bytes",
                payload.first(),
                payload.len()
            );
            return Err(DecryptionError::IntegrityCheckFailed);
        }

        Ok(DecryptedPayload(payload))
    }
}

/// `payload[0] == 0x0F` and `payload[L - 5k] == 0x06` for k = 1..=8.
///
/// A payload too short to hold the markers fails the check.
pub fn has_payload_markers(payload: &[u8]) -> bool {
    let len = payload.len();
    if payload.first() != Some(&PAYLOAD_START_MARKER) {
        return false;
    }

    (1..=REGISTER_COUNT).all(|k| {
        len.checked_sub(REGISTER_STRIDE * k)
            .and_then(|i| payload.get(i))
            .is_some_and(|&b| b == REGISTER_SEPARATOR)
    })
}
