//! Register extraction from a decrypted payload.
//!
//! The payload ends with eight `06 xx xx xx xx` items (double-long-unsigned,
//! big endian). Their positions are fixed relative to the end of the payload,
//! so the layout is a table of distances from the end rather than absolute
//! offsets.

use std::fmt;

use crate::constants::{
    PAYLOAD_START_MARKER, REGISTER_COUNT, REGISTER_SEPARATOR, REGISTER_STRIDE, REGISTER_WIDTH,
};
use crate::error::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    ActiveEnergyPos,
    ActiveEnergyNeg,
    ReactiveEnergyPos,
    ReactiveEnergyNeg,
    ActivePowerPos,
    ActivePowerNeg,
    ReactivePowerPos,
    ReactivePowerNeg,
}

impl Register {
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::ActiveEnergyPos,
        Register::ActiveEnergyNeg,
        Register::ReactiveEnergyPos,
        Register::ReactiveEnergyNeg,
        Register::ActivePowerPos,
        Register::ActivePowerNeg,
        Register::ReactivePowerPos,
        Register::ReactivePowerNeg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Register::ActiveEnergyPos => "active_energy_pos",
            Register::ActiveEnergyNeg => "active_energy_neg",
            Register::ReactiveEnergyPos => "reactive_energy_pos",
            Register::ReactiveEnergyNeg => "reactive_energy_neg",
            Register::ActivePowerPos => "active_power_pos",
            Register::ActivePowerNeg => "active_power_neg",
            Register::ReactivePowerPos => "reactive_power_pos",
            Register::ReactivePowerNeg => "reactive_power_neg",
        }
    }

    pub fn is_energy(self) -> bool {
        matches!(
            self,
            Register::ActiveEnergyPos
                | Register::ActiveEnergyNeg
                | Register::ReactiveEnergyPos
                | Register::ReactiveEnergyNeg
        )
    }

    /// Distance of the first value byte from the end of the payload.
    pub fn distance_from_end(self) -> usize {
        REGISTER_LAYOUT
            .iter()
            .find(|(register, _)| *register == self)
            .map(|&(_, distance)| distance)
            .unwrap_or_default()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Register → distance of its first value byte from the payload end.
///
/// Each value is followed by the next register's `06` tag, so consecutive
/// entries differ by the 5-byte stride.
pub const REGISTER_LAYOUT: [(Register, usize); REGISTER_COUNT] = [
    (Register::ActiveEnergyPos, 39),
    (Register::ActiveEnergyNeg, 34),
    (Register::ReactiveEnergyPos, 29),
    (Register::ReactiveEnergyNeg, 24),
    (Register::ActivePowerPos, 19),
    (Register::ActivePowerNeg, 14),
    (Register::ReactivePowerPos, 9),
    (Register::ReactivePowerNeg, 4),
];

/// Smallest payload that holds the start marker and all eight registers.
pub const MIN_PAYLOAD_LEN: usize = REGISTER_STRIDE * REGISTER_COUNT + 1;

/// The eight counters, unscaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawRegisters {
    pub active_energy_pos: u32,
    pub active_energy_neg: u32,
    pub reactive_energy_pos: u32,
    pub reactive_energy_neg: u32,
    pub active_power_pos: u32,
    pub active_power_neg: u32,
    pub reactive_power_pos: u32,
    pub reactive_power_neg: u32,
}

impl RawRegisters {
    pub fn get(&self, register: Register) -> u32 {
        match register {
            Register::ActiveEnergyPos => self.active_energy_pos,
            Register::ActiveEnergyNeg => self.active_energy_neg,
            Register::ReactiveEnergyPos => self.reactive_energy_pos,
            Register::ReactiveEnergyNeg => self.reactive_energy_neg,
            Register::ActivePowerPos => self.active_power_pos,
            Register::ActivePowerNeg => self.active_power_neg,
            Register::ReactivePowerPos => self.reactive_power_pos,
            Register::ReactivePowerNeg => self.reactive_power_neg,
        }
    }

    fn slot(&mut self, register: Register) -> &mut u32 {
        match register {
            Register::ActiveEnergyPos => &mut self.active_energy_pos,
            Register::ActiveEnergyNeg => &mut self.active_energy_neg,
            Register::ReactiveEnergyPos => &mut self.reactive_energy_pos,
            Register::ReactiveEnergyNeg => &mut self.reactive_energy_neg,
            Register::ActivePowerPos => &mut self.active_power_pos,
            Register::ActivePowerNeg => &mut self.active_power_neg,
            Register::ReactivePowerPos => &mut self.reactive_power_pos,
            Register::ReactivePowerNeg => &mut self.reactive_power_neg,
        }
    }

    pub fn set(&mut self, register: Register, value: u32) {
        *self.slot(register) = value;
    }

    /// Lay the registers out as a plaintext payload of `len` bytes: start
    /// marker, zero filler, then the eight tagged values.
    ///
    /// Returns `None` if `len` is below [`MIN_PAYLOAD_LEN`].
    pub fn to_payload(&self, len: usize) -> Option<Vec<u8>> {
        if len < MIN_PAYLOAD_LEN {
            return None;
        }

        let mut payload = vec![0u8; len];
        payload[0] = PAYLOAD_START_MARKER;
        for (register, distance) in REGISTER_LAYOUT {
            let offset = len - distance;
            payload[offset - 1] = REGISTER_SEPARATOR;
            payload[offset..offset + REGISTER_WIDTH]
                .copy_from_slice(&self.get(register).to_be_bytes());
        }
        Some(payload)
    }
}

/// Read the eight registers from the end of `payload`.
///
/// Offsets are resolved against the actual length and every read is bounds
/// checked; a short payload yields [`ExtractionError::OutOfBounds`] for the
/// first register that does not fit.
pub fn extract(payload: &[u8]) -> Result<RawRegisters, ExtractionError> {
    let len = payload.len();
    let mut registers = RawRegisters::default();

    for (register, distance) in REGISTER_LAYOUT {
        let offset = len.checked_sub(distance);
        let bytes = offset
            .and_then(|start| payload.get(start..start + REGISTER_WIDTH))
            .ok_or(ExtractionError::OutOfBounds {
                register,
                offset,
                len,
            })?;

        let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        registers.set(register, value);
    }

    Ok(registers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawRegisters {
        RawRegisters {
            active_energy_pos: 0x0102_0304,
            active_energy_neg: 2,
            reactive_energy_pos: 3,
            reactive_energy_neg: 4,
            active_power_pos: 5,
            active_power_neg: 6,
            reactive_power_pos: 7,
            reactive_power_neg: u32::MAX,
        }
    }

    #[test]
    fn test_layout_stride() {
        for pair in REGISTER_LAYOUT.windows(2) {
            assert_eq!(pair[0].1 - pair[1].1, REGISTER_STRIDE);
        }
        assert_eq!(REGISTER_LAYOUT[7].1, REGISTER_WIDTH);
        assert_eq!(Register::ActiveEnergyPos.distance_from_end(), 39);
        assert_eq!(Register::ReactivePowerNeg.distance_from_end(), 4);
    }

    #[test]
    fn test_extract_reads_big_endian_from_the_end() {
        let payload = sample().to_payload(91).unwrap();
        assert_eq!(&payload[91 - 39..91 - 35], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(payload[91 - 40], 0x06);
        assert_eq!(extract(&payload).unwrap(), sample());
    }

    #[test]
    fn test_extract_ignores_leading_bytes() {
        let mut payload = sample().to_payload(120).unwrap();
        for b in &mut payload[1..120 - 40] {
            *b = 0xEE;
        }
        assert_eq!(extract(&payload).unwrap(), sample());
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let err = extract(&[0u8; 38]).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::OutOfBounds {
                register: Register::ActiveEnergyPos,
                offset: None,
                len: 38
            }
        );

        assert!(extract(&[0u8; 39]).is_ok());
        assert!(matches!(
            extract(&[]),
            Err(ExtractionError::OutOfBounds { len: 0, .. })
        ));
    }

    #[test]
    fn test_to_payload_rejects_short_lengths() {
        assert!(sample().to_payload(MIN_PAYLOAD_LEN - 1).is_none());
        assert_eq!(sample().to_payload(MIN_PAYLOAD_LEN).map(|p| p.len()), Some(41));
    }

    #[test]
    fn test_energy_classification() {
        let energy: Vec<_> = Register::ALL.iter().filter(|r| r.is_energy()).collect();
        assert_eq!(energy.len(), 4);
        assert_eq!(Register::ReactivePowerPos.to_string(), "reactive_power_pos");
    }
}
