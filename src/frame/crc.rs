//! CRC-16/X-25 frame check sequence.
//!
//! Width 16, polynomial 0x1021, init 0xFFFF, reflected input and output,
//! final XOR 0xFFFF. The `crc` crate ships this as `CRC_16_IBM_SDLC`.

use crc::{Crc, CRC_16_IBM_SDLC};

const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Calculate the CRC-16/X-25 of `data`.
pub fn crc16_x25(data: &[u8]) -> u16 {
    X25.checksum(data)
}

/// Read the little-endian FCS stored in front of the closing flag.
///
/// Returns `None` if `frame` is too short to hold an FCS and a flag.
pub fn stored_fcs(frame: &[u8]) -> Option<u16> {
    let len = frame.len();
    let fcs = frame.get(len.checked_sub(3)?..len - 1)?;
    Some(u16::from_le_bytes([fcs[0], fcs[1]]))
}

/// Bytes covered by the FCS: everything between the opening flag and the FCS.
pub fn fcs_span(frame: &[u8]) -> Option<&[u8]> {
    frame.get(1..frame.len().checked_sub(3)?)
}
