//! AM550 Protocol Constants
//!
//! Wire-format constants for the AM550 customer interface (HDLC frame format
//! type 3 carrying a DLMS general-glo-ciphering APDU).

/// HDLC flag that opens and closes every frame
pub const FRAME_FLAG: u8 = 0x7E;

/// Frame format field high byte (type 3, no segmentation)
pub const FRAME_FORMAT: u8 = 0xA0;

/// Opening marker: flag followed by the frame format byte
pub const OPENING_MARKER: [u8; 2] = [FRAME_FLAG, FRAME_FORMAT];

/// Offset of the length byte; total frame length is this value + 2
pub const LENGTH_OFFSET: usize = 2;

/// Bytes not counted by the length byte (the two flags)
pub const LENGTH_ADJUST: usize = 2;

/// Number of bytes in front of the ciphertext
pub const HEADER_LEN: usize = 30;

/// FCS (2 bytes) plus closing flag
pub const TRAILER_LEN: usize = 3;

/// Frame length minus this is the ciphertext length
pub const FRAME_OVERHEAD: usize = HEADER_LEN + TRAILER_LEN;

/// Smallest frame the validator will index into
pub const MIN_FRAME_LEN: usize = FRAME_OVERHEAD;

/// Offset of the encrypted payload
pub const PAYLOAD_OFFSET: usize = HEADER_LEN;

/// System title: 8 bytes, also the first half of the CTR nonce
pub const SYSTEM_TITLE_OFFSET: usize = 16;
pub const SYSTEM_TITLE_LEN: usize = 8;

/// Invocation counter: 4 bytes, nonce bytes 8..12
pub const INVOCATION_COUNTER_OFFSET: usize = 26;
pub const INVOCATION_COUNTER_LEN: usize = 4;

/// Model identifier found at the start of the system title
pub const MODEL_ID_OFFSET: usize = 16;
pub const EXPECTED_MODEL_ID: [u8; 5] = [b'K', b'h', b'u', b'6', 0x86];

/// Security suite tag in the last nonce byte
pub const SECURITY_SUITE_TAG: u8 = 0x02;

/// First byte of a correctly decrypted payload (DLMS data-notification)
pub const PAYLOAD_START_MARKER: u8 = 0x0F;

/// Type tag (double-long-unsigned) in front of every register
pub const REGISTER_SEPARATOR: u8 = 0x06;

/// Register stride: separator plus 4 value bytes
pub const REGISTER_STRIDE: usize = 5;

/// Width of a register value
pub const REGISTER_WIDTH: usize = 4;

/// Number of registers at the end of the payload
pub const REGISTER_COUNT: usize = 8;

/// Default inter-byte silence that ends a frame, in milliseconds
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 100;

/// Default baud rate of the customer interface
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Default interval between transport polls, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 16;

/// Energy counters are published modulo this many Wh
pub const ENERGY_WRAP: u32 = 1_000_000;

/// Wh per kWh
pub const WH_PER_KWH: f32 = 1000.0;
