//! Criterion benchmarks for the receive → decode → build pipeline.
//!
//! Run with:
//! ```bash
//! cargo bench --package trmnl-core --bench bitmap_bench
//! ```

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trmnl_core::bitmap::encoder::encode_monochrome;
use trmnl_core::protocol::{receive, ScriptedSink};
use trmnl_core::{build, decode};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Frame sizes seen in practice: a small badge, the classic 512x342 surface,
/// and the largest frame that fits the default 64 KiB capacity.
const SIZES: &[(u32, u32)] = &[(64, 64), (512, 342), (800, 640)];

fn make_frame(width: u32, height: u32) -> Vec<u8> {
    let packed = (width as usize).div_ceil(8);
    let rows: Vec<Vec<u8>> = (0..height)
        .map(|y| vec![if y % 2 == 0 { 0xAA } else { 0x55 }; packed])
        .collect();
    encode_monochrome(width, height, &rows).unwrap()
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

fn bench_decode_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_and_build");
    for &(width, height) in SIZES {
        let frame = make_frame(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| build(&decode(black_box(frame.as_slice())).unwrap()).unwrap()),
        );
    }
    group.finish();
}

fn bench_receive(c: &mut Criterion) {
    let mut group = c.benchmark_group("receive");
    let frame = make_frame(512, 342);
    for chunk in [1460usize, 8192] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut sink = ScriptedSink::new().chunked(&frame, chunk);
                receive(&mut sink, 65_536, Duration::from_secs(60)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_and_build, bench_receive);
criterion_main!(benches);
