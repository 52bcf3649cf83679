//! # AM550 Frame Handling
//!
//! Turning a byte stream into validated frames: idle-timeout assembly,
//! marker/length/FCS validation, and the reverse direction for simulation.
//!
//! ```rust
//! use am550_rs::crypto::AesKey;
//! use am550_rs::frame::{validate, FrameBuilder};
//! use am550_rs::payload::RawRegisters;
//!
//! let key = AesKey::from([0u8; 16]);
//! let bytes = FrameBuilder::new().build(&key, &RawRegisters::default()).unwrap();
//! let frame = validate(bytes).unwrap();
//! assert_eq!(frame.len(), 124);
//! ```

pub mod assembler;
pub mod builder;
pub mod crc;
pub mod validator;

pub use assembler::FrameAssembler;
pub use builder::{BuildError, FrameBuilder};
pub use crc::crc16_x25;
pub use validator::{validate, ValidFrame};
