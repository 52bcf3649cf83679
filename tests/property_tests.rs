//! Property-based tests using proptest

mod common;

use am550_rs::crypto::build_nonce;
use am550_rs::frame::validate;
use am550_rs::payload::MIN_PAYLOAD_LEN;
use am550_rs::{extract, map, Am550Meter, Decryptor, FrameBuilder, RawRegisters};
use common::key;
use proptest::prelude::*;

fn registers() -> impl Strategy<Value = RawRegisters> {
    prop::array::uniform8(any::<u32>()).prop_map(|v| RawRegisters {
        active_energy_pos: v[0],
        active_energy_neg: v[1],
        reactive_energy_pos: v[2],
        reactive_energy_neg: v[3],
        active_power_pos: v[4],
        active_power_neg: v[5],
        reactive_power_pos: v[6],
        reactive_power_neg: v[7],
    })
}

proptest! {
    #[test]
    fn prop_validate_never_panics(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = validate(data);
    }

    #[test]
    fn prop_decode_never_panics(mut data in prop::collection::vec(any::<u8>(), 33..260)) {
        // Force the cheap checks to pass so the crypto path is exercised
        let len = data.len();
        data[0] = 0x7E;
        data[1] = 0xA0;
        data[2] = (len - 2) as u8;
        data[len - 1] = 0x7E;
        let _ = Am550Meter::new(key()).decode_frame(data);
    }

    #[test]
    fn prop_ctr_round_trip(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        title in any::<[u8; 8]>(),
        counter in any::<u32>(),
    ) {
        let decryptor = Decryptor::new(key());
        let nonce = build_nonce(&title, &counter.to_be_bytes());
        let mut buf = plaintext.clone();
        decryptor.apply_keystream(&nonce, &mut buf);
        decryptor.apply_keystream(&nonce, &mut buf);
        prop_assert_eq!(buf, plaintext);
    }

    #[test]
    fn prop_map_is_idempotent(raw in registers()) {
        prop_assert_eq!(map(&raw), map(&raw));
    }

    #[test]
    fn prop_energy_in_range(raw in registers()) {
        let reading = map(&raw);
        for energy in [
            reading.active_energy_pos,
            reading.active_energy_neg,
            reading.reactive_energy_pos,
            reading.reactive_energy_neg,
        ] {
            prop_assert!((0.0..1000.0).contains(&energy));
        }
        prop_assert_eq!(reading.active_energy_pos_raw, raw.active_energy_pos.to_string());
    }

    #[test]
    fn prop_extract_reads_back_payload(raw in registers(), len in MIN_PAYLOAD_LEN..200usize) {
        let payload = raw.to_payload(len).unwrap();
        prop_assert_eq!(extract(&payload).unwrap(), raw);
    }

    #[test]
    fn prop_built_frames_decode(raw in registers(), counter in any::<u32>()) {
        let frame = FrameBuilder::new()
            .invocation_counter(counter)
            .build(&key(), &raw)
            .unwrap();
        let reading = am550_rs::decode_frame(&frame, &key()).unwrap();
        prop_assert_eq!(reading, map(&raw));
    }
}
