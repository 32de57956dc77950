//! Criterion benchmarks for [`GestureRecognizer`].
//!
//! Classification runs on the input thread at every finger-up, so it has to
//! stay far below a frame budget even for strokes at the sample cap.
//!
//! Run with:
//! ```bash
//! cargo bench --package a11y-core --bench recognizer_bench
//! ```

use a11y_core::{GestureConfig, GestureRecognizer, Point, PointerSample, Timestamp};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A straight rightward stroke with `n` samples, 4 ms apart.
fn straight_stroke(n: usize) -> Vec<PointerSample> {
    (0..n)
        .map(|i| {
            PointerSample::new(
                0,
                Point::new(i as f64 * 12.0, 300.0 + (i % 3) as f64),
                Timestamp::from_millis(i as u64 * 4),
            )
        })
        .collect()
}

/// A right-then-down stroke with `n` samples split evenly between the legs.
fn l_stroke(n: usize) -> Vec<PointerSample> {
    let half = n / 2;
    (0..n)
        .map(|i| {
            let pos = if i < half {
                Point::new(i as f64 * 12.0, 0.0)
            } else {
                Point::new(half as f64 * 12.0, (i - half) as f64 * 12.0)
            };
            PointerSample::new(0, pos, Timestamp::from_millis(i as u64 * 4))
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let recognizer = GestureRecognizer::new(GestureConfig::default());
    let mut group = c.benchmark_group("classify");

    for n in [16usize, 64, 256] {
        let straight = straight_stroke(n);
        group.bench_with_input(BenchmarkId::new("straight", n), &straight, |b, s| {
            b.iter(|| recognizer.classify(black_box(s)))
        });

        let bent = l_stroke(n);
        group.bench_with_input(BenchmarkId::new("compound", n), &bent, |b, s| {
            b.iter(|| recognizer.classify(black_box(s)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
