// Shared fixtures for the integration tests
#![allow(dead_code)]

use am550_rs::{AesKey, FrameBuilder, RawRegisters};

pub const KEY_HEX: &str = "00112233445566778899AABBCCDDEEFF";

pub fn key() -> AesKey {
    AesKey::from_hex(KEY_HEX).unwrap()
}

/// Registers of the reference reading used across the suite.
pub fn reference_registers() -> RawRegisters {
    RawRegisters {
        active_energy_pos: 10_000_500,
        active_energy_neg: 0,
        reactive_energy_pos: 500_000,
        reactive_energy_neg: 0,
        active_power_pos: 1200,
        active_power_neg: 0,
        reactive_power_pos: 300,
        reactive_power_neg: 0,
    }
}

/// 124-byte frame carrying `registers`, encrypted with [`key`].
pub fn frame_with(registers: &RawRegisters) -> Vec<u8> {
    FrameBuilder::new().build(&key(), registers).unwrap()
}

pub fn reference_frame() -> Vec<u8> {
    frame_with(&reference_registers())
}

/// Recompute the FCS after a test has edited the frame body.
pub fn refresh_fcs(frame: &mut [u8]) {
    let len = frame.len();
    let fcs = am550_rs::frame::crc16_x25(&frame[1..len - 3]).to_le_bytes();
    frame[len - 3..len - 1].copy_from_slice(&fcs);
}
