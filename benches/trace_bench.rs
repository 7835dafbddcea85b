use blight_sim::core::config::TraceConfig;
use blight_sim::core::registry::DefinitionRegistry;
use blight_sim::core::types::{Cell, FactionId, RegionBounds};
use blight_sim::core::BlightConfig;
use blight_sim::host::sandbox::SandboxHost;
use blight_sim::host::{AgentDirectory, TerrainTag};
use blight_sim::simulation::BlightWorld;
use blight_sim::trace::TraceField;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn filled_field(size: i32) -> TraceField {
    let mut field = TraceField::new(&TraceConfig::default());
    for x in 0..size {
        for z in 0..size {
            if (x * 7 + z * 13) % 3 == 0 {
                field.deposit(Cell::new(x, z), 5.0 + (x + z) as f32 % 20.0, false, (x * z) as u64, TerrainTag::Soil);
            }
        }
    }
    field
}

fn bench_trace_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_field");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for &size in &[64_i32, 128, 256] {
        group.bench_function(format!("decay_pass_{}x{}", size, size), |b| {
            b.iter_batched(
                || filled_field(size),
                |mut field| field.decay_pass(10_000),
                BatchSize::LargeInput,
            );
        });
        group.bench_function(format!("query_r5_{}x{}", size, size), |b| {
            let mut field = filled_field(size);
            let center = Cell::new(size / 2, size / 2);
            b.iter(|| field.query(center, 5.0, 100));
        });
    }
    group.finish();
}

fn bench_world_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("blight_tick");
    group.sample_size(20);

    // Agents per bench; override with BLIGHT_BENCH_AGENTS=100,500
    let agents_list: Vec<usize> = std::env::var("BLIGHT_BENCH_AGENTS")
        .ok()
        .map(|s| s.split(',').filter_map(|t| t.trim().parse::<usize>().ok()).collect::<Vec<_>>())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![100_usize, 500]);

    for &agents in &agents_list {
        group.bench_function(format!("ticks600_agents{}", agents), |b| {
            b.iter_batched(
                || {
                    let mut host = SandboxHost::new();
                    let region = host.add_region(RegionBounds::new(120, 120), true);
                    let mut world =
                        BlightWorld::new(BlightConfig::default(), DefinitionRegistry::standard(FactionId(66)))
                            .expect("default config is valid");
                    for i in 0..agents {
                        let cell = Cell::new(1 + (i as i32 * 7) % 118, 1 + (i as i32 * 13) % 118);
                        let id = host.add_agent(region, cell);
                        if i % 4 == 0 {
                            world.turn(&mut host, id, 0).expect("agent exists");
                        } else {
                            host.set_faction(id, Some(FactionId(1))).expect("agent exists");
                        }
                    }
                    (world, host)
                },
                |(mut world, mut host)| {
                    for now in 1..=600 {
                        world.tick(&mut host, now);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_trace_field, bench_world_tick);
criterion_main!(benches);
