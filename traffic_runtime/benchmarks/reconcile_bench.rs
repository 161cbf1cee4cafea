use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use traffic_runtime::{
    ActiveVehicle, EngineSnapshot, PerDirection, Reconciler, RenderState, VehicleSets,
    WirePosition,
};

fn snapshot(count: usize, offset: f64) -> EngineSnapshot {
    let active: BTreeMap<String, ActiveVehicle> = (0..count)
        .map(|index| {
            let lane = index % 4;
            let distance = 100.0 - (index as f64 % 80.0) - offset;
            let (x, y) = match lane {
                0 => (0.0, distance),
                1 => (0.0, -distance),
                2 => (distance, 0.0),
                _ => (-distance, 0.0),
            };
            (
                index.to_string(),
                ActiveVehicle {
                    kind: if index % 10 == 0 { "ambulance" } else { "car" }.to_string(),
                    position: WirePosition { x, y },
                    stopped: index % 3 == 0,
                    priority: None,
                    origin: None,
                    destination: None,
                },
            )
        })
        .collect();
    EngineSnapshot {
        lights: PerDirection::from_fn(|_| "red".to_string()),
        algorithm: "bench".to_string(),
        next_lane: None,
        vehicles: VehicleSets {
            active,
            queued: BTreeMap::new(),
        },
    }
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let reconciler = Reconciler::default();

    for count in [16usize, 128, 1024] {
        let first = snapshot(count, 0.0);
        let second = snapshot(count, 1.5);
        group.bench_with_input(BenchmarkId::new("moving", count), &count, |b, _| {
            b.iter_batched(
                || {
                    let mut state = RenderState::default();
                    reconciler.apply(&mut state, &first);
                    state
                },
                |mut state| {
                    reconciler.apply(&mut state, &second);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(reconcile_benches, bench_reconcile);
criterion_main!(reconcile_benches);
