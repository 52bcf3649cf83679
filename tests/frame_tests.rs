//! Tests for frame assembly and validation
//!
//! Covers the CRC-16/X-25 reference vectors, each validator rejection and
//! the idle-timeout boundary of the assembler.

mod common;

use std::time::{Duration, Instant};

use am550_rs::frame::crc::{fcs_span, stored_fcs};
use am550_rs::frame::{crc16_x25, validate, FrameAssembler};
use am550_rs::{Am550Error, Am550Meter, CrcError, FrameError, FramingError};
use common::{key, reference_frame, refresh_fcs};

#[test]
fn test_crc_reference_vectors() {
    assert_eq!(crc16_x25(b"123456789"), 0x906E);
    assert_eq!(crc16_x25(&[]), 0x0000);
}

#[test]
fn test_reference_frame_fcs_covers_body() {
    let frame = reference_frame();
    let span = fcs_span(&frame).unwrap();
    assert_eq!(span.len(), frame.len() - 4);
    assert_eq!(stored_fcs(&frame), Some(crc16_x25(span)));
}

#[test]
fn test_valid_frame_fields() {
    let frame = validate(reference_frame()).unwrap();
    assert_eq!(frame.len(), 124);
    assert_eq!(&frame.system_title()[..5], b"Khu6\x86");
    assert_eq!(frame.invocation_counter(), 1);
    assert_eq!(frame.ciphertext().len(), 91);
    assert!(frame.model_warning().is_none());
}

#[test]
fn test_too_short() {
    let frame = [0x7E, 0xA0, 0x1E, 0x7E];
    assert_eq!(
        validate(frame.to_vec()),
        Err(FrameError::Framing(FramingError::TooShort { len: 4, min: 33 }))
    );
    assert!(matches!(
        validate(Vec::<u8>::new()),
        Err(FrameError::Framing(FramingError::TooShort { len: 0, .. }))
    ));
}

#[test]
fn test_bad_opening_marker() {
    let mut frame = reference_frame();
    frame[1] = 0xA8;
    assert_eq!(
        validate(frame),
        Err(FrameError::Framing(FramingError::BadOpeningMarker {
            found0: 0x7E,
            found1: 0xA8
        }))
    );
}

#[test]
fn test_length_mismatch() {
    let mut frame = reference_frame();
    frame.push(0x00);
    assert_eq!(
        validate(frame),
        Err(FrameError::Framing(FramingError::LengthMismatch {
            actual: 125,
            declared: 124
        }))
    );

    let mut frame = reference_frame();
    frame[2] = 0x10;
    assert!(matches!(
        validate(frame),
        Err(FrameError::Framing(FramingError::LengthMismatch { declared: 18, .. }))
    ));
}

#[test]
fn test_bad_closing_marker() {
    let mut frame = reference_frame();
    *frame.last_mut().unwrap() = 0x7F;
    assert_eq!(
        validate(frame),
        Err(FrameError::Framing(FramingError::BadClosingMarker { found: 0x7F }))
    );
}

#[test]
fn test_crc_mismatch_on_flipped_bit() {
    let mut frame = reference_frame();
    frame[60] ^= 0x01;
    match validate(frame) {
        Err(FrameError::Crc(CrcError::Mismatch {
            calculated,
            expected,
        })) => assert_ne!(calculated, expected),
        other => panic!("expected crc mismatch, got {other:?}"),
    }
}

#[test]
fn test_unknown_model_is_only_a_warning() {
    let mut frame = reference_frame();
    frame[16..21].copy_from_slice(b"XYZ01");
    refresh_fcs(&mut frame);

    let valid = validate(frame).unwrap();
    let warning = valid.model_warning().unwrap();
    assert_eq!(&warning.found, b"XYZ01");
    assert!(warning.to_string().contains("XYZ01"));
}

#[test]
fn test_rejected_frames_never_reach_decryptor() {
    let meter = Am550Meter::new(key());

    let mut short = reference_frame();
    short.truncate(20);
    let mut bad_open = reference_frame();
    bad_open[0] = 0x00;
    let mut bad_len = reference_frame();
    bad_len[2] = 0x7B;
    let mut bad_close = reference_frame();
    bad_close[123] = 0x00;
    let mut bad_crc = reference_frame();
    bad_crc[122] ^= 0xFF;

    for frame in [short, bad_open, bad_len, bad_close, bad_crc] {
        let err = meter.decode_frame(frame).unwrap_err();
        assert!(err.is_frame_error(), "unexpected error {err:?}");
        assert!(!matches!(err, Am550Error::Decryption(_)));
    }
}

#[test]
fn test_assembler_timeout_is_strict() {
    let timeout = Duration::from_millis(100);
    let mut assembler = FrameAssembler::new(timeout);
    let t0 = Instant::now();

    assembler.extend(&reference_frame(), t0);
    assert!(assembler.poll(t0 + timeout).is_none());

    let frame = assembler.poll(t0 + timeout + Duration::from_millis(1)).unwrap();
    assert_eq!(frame.len(), 124);
    assert!(assembler.is_empty());
    assert!(validate(frame).is_ok());
}

#[test]
fn test_assembler_late_byte_restarts_timeout() {
    let mut assembler = FrameAssembler::default();
    let t0 = Instant::now();

    assembler.append(0x7E, t0);
    assembler.append(0xA0, t0 + Duration::from_millis(90));
    assert!(assembler.poll(t0 + Duration::from_millis(150)).is_none());

    let frame = assembler.poll(t0 + Duration::from_millis(191)).unwrap();
    assert_eq!(&frame[..], &[0x7E, 0xA0]);
}

#[test]
fn test_back_to_back_frames_without_gap_are_one_blob() {
    let meter = Am550Meter::new(key());
    let mut assembler = FrameAssembler::default();
    let t0 = Instant::now();

    assembler.extend(&reference_frame(), t0);
    assembler.extend(&reference_frame(), t0 + Duration::from_millis(10));
    let blob = assembler.poll(t0 + Duration::from_millis(200)).unwrap();
    assert_eq!(blob.len(), 248);

    assert!(matches!(
        meter.decode_frame(blob),
        Err(Am550Error::Framing(FramingError::LengthMismatch { .. }))
    ));
}
