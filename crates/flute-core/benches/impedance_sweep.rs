use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use flute_core::radiation::{STOPPED, UNFLANGED};
use flute_core::{
    impedance_sweep, AirConditions, Bore, BoreSegment, EmbouchureHole, Head, Hole, SweepRange,
    UnitCell, Woodwind, MAX_SEGMENT_LENGTH,
};

/// A six-hole flute with a tapered head joint.
fn six_hole_flute() -> Woodwind {
    let head = Head::new(
        Some(EmbouchureHole::new(0.0048, 0.0052, 0.0043, 0.0095)),
        Bore::new(vec![BoreSegment::cylinder(0.0095, 0.017)]),
        STOPPED,
        Bore::new(vec![
            BoreSegment::new(0.0095, 0.0087, 0.12),
            BoreSegment::cylinder(0.0087, 0.2),
        ]),
    );
    let cells = (0..6)
        .map(|i| {
            UnitCell::new(
                Hole::new(0.0035 + 0.0002 * i as f64, 0.003, 0.0087, None),
                Bore::new(vec![BoreSegment::cylinder(0.0087, 0.025)]),
            )
        })
        .collect();
    let mut flute = Woodwind::new(head, cells, UNFLANGED);
    flute.discretise(MAX_SEGMENT_LENGTH);
    flute.set_air_properties(&AirConditions::played());
    flute
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("impedance_sweep");
    for step in [10.0, 2.0] {
        let range = SweepRange::new(200.0, 4000.0, step).expect("valid range");
        group.throughput(Throughput::Elements(range.len() as u64));
        group.bench_with_input(BenchmarkId::new("fresh", step), &range, |b, range| {
            b.iter_batched(
                six_hole_flute,
                |mut flute| black_box(impedance_sweep(&mut flute, range, 1.0)),
                BatchSize::LargeInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("two_fingerings", step), &range, |b, range| {
            let mut flute = six_hole_flute();
            b.iter(|| {
                for fingering in ["XXXOOO", "XXXXXX"] {
                    flute.set_fingering(fingering).expect("six holes");
                    black_box(impedance_sweep(&mut flute, range, 1.0));
                }
            })
        });
    }
    group.finish();
}

fn bench_single_frequency(c: &mut Criterion) {
    let mut flute = six_hole_flute();
    let mut f = 200.0;
    c.bench_function("input_impedance_uncached", |b| {
        b.iter(|| {
            // a new frequency every call defeats the caches
            f += 0.001;
            black_box(flute.input_impedance(black_box(f), 1.0))
        })
    });
}

criterion_group!(benches, bench_sweep, bench_single_frequency);
criterion_main!(benches);
