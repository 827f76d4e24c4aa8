//! Benchmarks for the Tachyon hash.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tachyon_core::Hasher;

fn bench_short(c: &mut Criterion) {
    // Under 64 bytes: the single-block fast path.
    c.bench_function("tachyon_short", |b| {
        b.iter(|| tachyon_core::hash(black_box(b"short benchmark input")))
    });
}

fn bench_sizes(c: &mut Criterion) {
    for size in [256usize, 4096, 65536, 1 << 20] {
        let data = vec![0xA5u8; size];
        c.bench_function(&format!("tachyon_{}", size), |b| {
            b.iter(|| tachyon_core::hash(black_box(&data)))
        });
    }
}

fn bench_streaming(c: &mut Criterion) {
    let data = vec![0x3Cu8; 1 << 20];
    c.bench_function("tachyon_streaming_1mib", |b| {
        b.iter(|| {
            let mut hasher = Hasher::new();
            for chunk in data.chunks(64 * 1024) {
                hasher.update(black_box(chunk));
            }
            hasher.finalize()
        })
    });
}

criterion_group!(benches, bench_short, bench_sizes, bench_streaming);
criterion_main!(benches);
