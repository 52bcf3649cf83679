//! Benchmarks for the frame pipeline
//!
//! Measures the checksum, the CTR keystream and a full decode of a
//! 124-byte frame.

use std::time::Duration;

use am550_rs::crypto::build_nonce;
use am550_rs::frame::{crc16_x25, validate};
use am550_rs::{decode_frame, AesKey, Decryptor, FrameBuilder, RawRegisters};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn key() -> AesKey {
    AesKey::from([0x11; 16])
}

fn sample_frame() -> Vec<u8> {
    let registers = RawRegisters {
        active_energy_pos: 10_000_500,
        reactive_energy_pos: 500_000,
        active_power_pos: 1200,
        reactive_power_pos: 300,
        ..Default::default()
    };
    FrameBuilder::new()
        .build(&key(), &registers)
        .expect("sample frame")
}

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16_x25");
    for size in [32usize, 120, 253] {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| crc16_x25(black_box(data)))
        });
    }
    group.finish();
}

fn bench_keystream(c: &mut Criterion) {
    let decryptor = Decryptor::new(key());
    let nonce = build_nonce(b"Khu6\x86\x00\x00\x01", &[0, 0, 0, 1]);
    let mut buf = vec![0u8; 91];

    c.bench_function("ctr_keystream_91", |b| {
        b.iter(|| decryptor.apply_keystream(black_box(&nonce), black_box(&mut buf)))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(Duration::from_secs(5));

    let frame = sample_frame();
    let key = key();

    group.bench_function("validate", |b| {
        b.iter(|| validate(black_box(frame.clone())))
    });
    group.bench_function("decode_frame", |b| {
        b.iter(|| decode_frame(black_box(&frame), &key))
    });
    group.finish();
}

criterion_group!(benches, bench_crc, bench_keystream, bench_pipeline);
criterion_main!(benches);
