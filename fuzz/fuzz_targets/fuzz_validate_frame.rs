#![no_main]

use am550_rs::{decode_frame, validate, AesKey};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must be rejected without panicking
    let _ = validate(data.to_vec());

    // Patch markers and length so the decrypt and extract paths are reached
    if data.len() >= 33 && data.len() <= 257 {
        let mut framed = data.to_vec();
        let len = framed.len();
        framed[0] = 0x7E;
        framed[1] = 0xA0;
        framed[2] = (len - 2) as u8;
        framed[len - 1] = 0x7E;
        let _ = decode_frame(&framed, &AesKey::from([0u8; 16]));
    }
});
