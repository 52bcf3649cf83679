//! # Payload Decoding
//!
//! Extraction of the eight register values from a decrypted payload and
//! their mapping to published values.

pub mod reading;
pub mod registers;

pub use reading::{map, scale_energy, scale_power, MeterReading};
pub use registers::{extract, RawRegisters, Register, MIN_PAYLOAD_LEN, REGISTER_LAYOUT};
