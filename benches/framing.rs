//! Benchmarks for the frame codec.
//!
//! Tests: encode into a fresh buffer, in-place sealing through a reused
//! frame buffer, and full decode of a framed stream.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use xxhash_rust::xxh64::Xxh64;

use udpmux::frame::{encode_into, read_frame, Frame, FrameBuf, MAX_PAYLOAD, OVERHEAD};

const PAYLOAD_SIZES: &[usize] = &[188, 1316, MAX_PAYLOAD];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/encode");

    for &size in PAYLOAD_SIZES {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes((OVERHEAD + size) as u64));

        group.bench_function(format!("encode_into/{size}"), |b| {
            let mut out = Vec::with_capacity(OVERHEAD + size);
            b.iter(|| {
                out.clear();
                encode_into(7001, black_box(&payload), &mut out).unwrap();
                black_box(&out);
            });
        });

        group.bench_function(format!("seal/{size}"), |b| {
            let mut framed = FrameBuf::new();
            let mut hasher = Xxh64::new(0);
            framed.payload_mut()[..size].copy_from_slice(&payload);
            b.iter(|| {
                black_box(framed.seal(7001, black_box(size), &mut hasher).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame/decode");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for &size in PAYLOAD_SIZES {
        let payload = vec![0xA5u8; size];
        let mut wire = Vec::new();
        encode_into(7001, &payload, &mut wire).unwrap();
        group.throughput(Throughput::Bytes(wire.len() as u64));

        group.bench_function(format!("read_frame/{size}"), |b| {
            let mut buf = vec![0u8; MAX_PAYLOAD];
            let mut hasher = Xxh64::new(0);
            b.iter(|| {
                let frame = rt
                    .block_on(read_frame(&mut black_box(&wire[..]), &mut buf, &mut hasher))
                    .unwrap();
                assert!(matches!(frame, Frame::Valid { .. }));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
