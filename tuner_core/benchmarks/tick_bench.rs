use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tuner_core::{
    build_tuner_app, run_tick, vehicle_manifest, InMemoryHost, TunerConfig, TunerSession,
};

fn session(host: &InMemoryHost, overrides_active: bool) -> TunerSession {
    let mut session = TunerSession::new(
        &vehicle_manifest(),
        Arc::new(host.clone()),
        std::env::temp_dir().join("tuner_tick_bench"),
        Arc::new(TunerConfig::default()),
    );
    if overrides_active {
        session.commit("power_multiplier_override", "1.8");
        session.set_override_enabled("power_multiplier_override_enabled", true);
        session.commit("front_wheels_offset_x", "0.03");
        session.set_offsets_enabled("custom_wheels_offset_enabled", true);
    }
    session
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for active in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("overrides_active", active),
            &active,
            |b, &active| {
                b.iter_batched(
                    || build_tuner_app(session(&InMemoryHost::vehicle_demo(), active)),
                    |mut app| {
                        for _ in 0..16 {
                            run_tick(&mut app);
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.bench_function("capture", |b| {
        let host = InMemoryHost::vehicle_demo();
        let session = session(&host, true);
        b.iter(|| session.capture());
    });

    group.finish();
}

criterion_group!(tick_benches, bench_tick);
criterion_main!(tick_benches);
