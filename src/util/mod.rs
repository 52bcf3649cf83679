//! # Utility Modules
//!
//! Hex encoding/decoding and logging helpers shared by the pipeline, the
//! serial runner and the CLI.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex, format_hex_compact, pretty_hex, HexError};
pub use logging::{log_frame_compact, log_frame_hex, LogThrottle};
