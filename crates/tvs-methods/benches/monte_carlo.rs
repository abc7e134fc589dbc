use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use tvs_math::{CorrelationStructure, InverseCumulativeNormalRng};
use tvs_methods::{PathGenerator, TimeGrid};
use tvs_processes::LocalVolatilityModel;
use tvs_termstructures::{
    DiscountCurve, EquityForwardCurve, FlatDiscountCurve, ForwardCurve,
    InterpolatedLocalVolSurface, LocalVolSurface,
};

fn generator(fine_steps: usize) -> PathGenerator {
    let d: Arc<dyn DiscountCurve> = Arc::new(FlatDiscountCurve::new(0.01));
    let f: Vec<Arc<dyn ForwardCurve>> = vec![
        Arc::new(
            EquityForwardCurve::new(100.0, d.clone(), &[-0.0002, -0.0001, -0.00011], &[
                30.0 / 365.0,
                223.0 / 365.0,
                466.0 / 365.0,
            ])
            .expect("valid forward curve"),
        ),
        Arc::new(EquityForwardCurve::without_repo(50.0, d).expect("valid forward curve")),
    ];
    let surface = |spot: f64| -> Arc<dyn LocalVolSurface> {
        Arc::new(
            InterpolatedLocalVolSurface::new(
                spot,
                &[0.0, 1.0, 3.0],
                &[0.6, 1.0, 1.4],
                &[0.30, 0.20, 0.18, 0.28, 0.21, 0.19, 0.26, 0.22, 0.20],
            )
            .expect("valid surface"),
        )
    };
    let lv = vec![surface(100.0), surface(50.0)];
    let corr = CorrelationStructure::from_row_slice(2, &[1.0, 0.5, 0.5, 1.0]).expect("valid correlation");
    let model = LocalVolatilityModel::new(f, lv, corr).expect("consistent basket");
    PathGenerator::new(
        Arc::new(model),
        TimeGrid::monthly(3.0, fine_steps).expect("valid grid"),
    )
}

fn bench_path_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("lv_path_generation");
    for fine_steps in [2usize, 20, 60] {
        let g = generator(fine_steps);
        group.bench_with_input(BenchmarkId::from_parameter(fine_steps), &fine_steps, |b, _| {
            let mut rng = InverseCumulativeNormalRng::new(42);
            b.iter(|| black_box(g.next_path(&mut rng)))
        });
    }
    group.finish();
}

fn bench_path_stream(c: &mut Criterion) {
    let g = generator(2);
    c.bench_function("lv_stream_1000_paths", |b| {
        b.iter(|| {
            let terminal: f64 = g
                .stream(InverseCumulativeNormalRng::new(7), 1_000)
                .map(|p| p.terminal_prices()[0])
                .sum();
            black_box(terminal)
        })
    });
}

criterion_group!(benches, bench_path_generation, bench_path_stream);
criterion_main!(benches);
