//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for key parsing, the CLI `decode`/`simulate` commands and
//! trace-level frame dumps.
//!
//! ```rust
//! use am550_rs::util::hex::{encode_hex, decode_hex, format_hex_compact};
//!
//! let data = [0x7e, 0xa0, 0x7a];
//! assert_eq!(encode_hex(&data), "7ea07a");
//! assert_eq!(decode_hex("7E A0 7A").unwrap(), data);
//! assert_eq!(format_hex_compact(&data), "7e a0 7a");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is stripped first, so `"7E A0"` and `"7ea0"` decode the same.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Pretty-print hex data with offsets and an ASCII column
///
/// Used for trace-level dumps of raw frames and decrypted payloads.
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let bytes_per_line = bytes_per_line.max(1);
    let mut lines = Vec::with_capacity(data.len().div_ceil(bytes_per_line));

    for (i, chunk) in data.chunks(bytes_per_line).enumerate() {
        let hex_part = format_hex_compact(chunk);
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        lines.push(format!(
            "{:04x}: {:<width$} |{}|",
            i * bytes_per_line,
            hex_part,
            ascii,
            width = bytes_per_line * 3 - 1
        ));
    }

    lines.join("\n")
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "7e a0 7a" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
