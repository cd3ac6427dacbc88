use criterion::{criterion_group, criterion_main, Criterion};
use radshield::hardening::CriticalityMetrics;
use radshield::{
    ApproximateTmr, HardeningConfig, HardeningStrategy, HealthWeightedTmr, HistoryWeightedTmr,
    NetworkComponent, SelectiveHardening, VoterConfig,
};
use std::hint::black_box;

fn bench_voters(c: &mut Criterion) {
    let mut group = c.benchmark_group("tmr_read");

    let throttled = HealthWeightedTmr::new(1.5f64);
    group.bench_function("health_weighted_throttled", |b| {
        b.iter(|| black_box(throttled.get()));
    });

    let verifying = HealthWeightedTmr::with_config(1.5f64, VoterConfig::always_verify());
    group.bench_function("health_weighted_always_verify", |b| {
        b.iter(|| black_box(verifying.get()));
    });

    let mut history = HistoryWeightedTmr::new(1.5f64);
    group.bench_function("history_weighted", |b| {
        b.iter(|| black_box(history.get()));
    });

    let mut approximate = ApproximateTmr::new(1.5f64);
    group.bench_function("approximate", |b| {
        b.iter(|| black_box(approximate.get()));
    });

    group.finish();
}

fn bench_allocator(c: &mut Criterion) {
    let components: Vec<NetworkComponent> = (0..10_000)
        .map(|i| {
            let x = ((i * 7919) % 1000) as f64 / 1000.0;
            NetworkComponent::new(
                format!("w{}", i),
                format!("layer{}", i % 16),
                x,
                CriticalityMetrics::new(x, 1.0 - x, x * x, 0.2, 0.5),
            )
        })
        .collect();

    let mut group = c.benchmark_group("hardening_analyze_10k");
    for strategy in [
        HardeningStrategy::FixedThreshold,
        HardeningStrategy::ResourceConstrained,
        HardeningStrategy::LayerwiseImportance,
    ] {
        let hardening = SelectiveHardening::new(HardeningConfig::new(strategy, 0.3)).unwrap();
        group.bench_function(strategy.name(), |b| {
            b.iter(|| hardening.analyze(black_box(&components)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_voters, bench_allocator);
criterion_main!(benches);
