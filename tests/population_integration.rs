//! Integration tests for the population scheduler
//!
//! These tests verify the region population lifecycle:
//! - Groups are requested at the map edge once the spawn interval passes
//! - The cap blocks spawning until eviction brings the count back down
//! - Evicted agents walk off and are forgotten on departure
//! - Exiting, incapacitated and locked agents are never chosen for eviction

use blight_sim::core::config::{PopulationConfig, TrendConfig};
use blight_sim::core::registry::DefinitionRegistry;
use blight_sim::core::types::{AgentId, Cell, FactionId, RegionBounds, RegionId, Tick};
use blight_sim::core::BlightConfig;
use blight_sim::host::sandbox::SandboxHost;
use blight_sim::host::{AgentDirectory, BlightEvent};
use blight_sim::population::scheduler::{eviction_candidates, PopulationScheduler};
use blight_sim::simulation::BlightWorld;
use blight_sim::threat::ThreatTrend;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const BLIGHT: FactionId = FactionId(66);

fn crowded_config(max_population: usize) -> BlightConfig {
    BlightConfig {
        population: PopulationConfig {
            max_population,
            // Any trend above 0.5 always wins the roll
            spawn_chance_scale: 2.0,
            ..PopulationConfig::default()
        },
        trend: TrendConfig {
            baseline: 0.9,
            amplitude: 0.0,
            ..TrendConfig::default()
        },
        ..BlightConfig::default()
    }
}

fn setup(config: BlightConfig) -> (BlightWorld, SandboxHost, RegionId) {
    let mut host = SandboxHost::new();
    let region = host.add_region(RegionBounds::new(40, 40), true);
    let mut world = BlightWorld::new(config, DefinitionRegistry::standard(BLIGHT)).unwrap();
    world.ensure_region(region, 0);
    (world, host, region)
}

fn count<F: Fn(&BlightEvent) -> bool>(events: &[BlightEvent], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn test_spawn_request_after_interval() {
    let (mut world, mut host, region) = setup(crowded_config(10));
    let mut requests = Vec::new();
    for now in 1..=2_600 {
        for event in world.tick(&mut host, now) {
            if let BlightEvent::SpawnRequested { near, count, .. } = event {
                requests.push((now, near, count));
            }
        }
    }
    assert_eq!(requests.len(), 1, "one request once the interval has passed");
    let (at, near, size) = requests[0];
    assert!(at >= 2_500);
    assert!(RegionBounds::new(40, 40).is_boundary(near));
    assert!((2..=5).contains(&size), "high trend uses the large group range");

    let spawned = world.fulfil_spawn(&mut host, region, near, size, at).unwrap();
    assert_eq!(spawned.len(), size as usize);
    assert!(spawned.iter().all(|id| world.is_turned(*id)));
}

#[test]
fn test_cap_blocks_spawning_until_evicted() {
    let (mut world, mut host, region) = setup(crowded_config(3));
    let spawned = world.fulfil_spawn(&mut host, region, Cell::new(20, 20), 5, 0).unwrap();
    assert_eq!(spawned.len(), 5);

    let mut evicted = Vec::new();
    let mut spawn_requests = 0;
    for now in 1..=3_000 {
        let events = world.tick(&mut host, now);
        spawn_requests += count(&events, |e| matches!(e, BlightEvent::SpawnRequested { .. }));
        for event in &events {
            if let BlightEvent::EvictRequested { agent, depart_at, .. } = event {
                assert!(*depart_at >= now + 100 && *depart_at <= now + 250);
                evicted.push(*agent);
            }
        }
        for gone in host.depart_due(now) {
            world.on_agent_removed(gone);
        }
    }

    assert_eq!(evicted.len(), 2, "excess of two is evicted once");
    assert_eq!(spawn_requests, 0, "still at the cap after eviction");
    assert_eq!(world.turned_count(), 3);
    for agent in &evicted {
        assert!(host.status(*agent).is_none(), "{} should have left", agent);
        assert!(!world.is_turned(*agent));
    }
}

#[test]
fn test_room_below_cap_allows_spawning() {
    let (mut world, mut host, region) = setup(crowded_config(3));
    let spawned = world.fulfil_spawn(&mut host, region, Cell::new(20, 20), 2, 0).unwrap();
    assert_eq!(spawned.len(), 2);

    let mut requests = 0;
    for now in 1..=2_600 {
        requests += count(&world.tick(&mut host, now), |e| {
            matches!(e, BlightEvent::SpawnRequested { .. })
        });
    }
    assert_eq!(requests, 1);
}

#[test]
fn test_trapped_agent_stays_put() {
    let (mut world, mut host, region) = setup(crowded_config(0));
    let spawned = world.fulfil_spawn(&mut host, region, Cell::new(20, 20), 1, 0).unwrap();
    let trapped = spawned[0];
    let position = host.status(trapped).unwrap().position;
    for n in position.neighbors() {
        host.set_walkable(region, n, false);
    }

    for now in 1..=10 {
        let events = world.tick(&mut host, now);
        assert_eq!(count(&events, |e| matches!(e, BlightEvent::EvictRequested { .. })), 0);
    }
    assert!(!host.status(trapped).unwrap().exiting);
}

#[derive(Debug, Clone)]
struct Flags {
    exiting: bool,
    incapacitated: bool,
    locked: bool,
    level: u32,
    market_value: f32,
}

fn flags() -> impl Strategy<Value = Flags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), 1u32..5, 0.0f32..1000.0).prop_map(
        |(exiting, incapacitated, locked, level, market_value)| Flags {
            exiting,
            incapacitated,
            locked,
            level,
            market_value,
        },
    )
}

proptest! {
    #[test]
    fn prop_eviction_skips_busy_agents(agents in prop::collection::vec(flags(), 1..12), excess in 1usize..12) {
        let mut host = SandboxHost::new();
        let region = host.add_region(RegionBounds::new(20, 20), true);
        let mut turned: Vec<(AgentId, u32)> = Vec::new();
        for (i, f) in agents.iter().enumerate() {
            let id = host.add_agent(region, Cell::new(2 + (i as i32 % 16), 5 + (i as i32 / 16)));
            let status = host.status_mut(id).unwrap();
            status.exiting = f.exiting;
            status.incapacitated = f.incapacitated;
            status.locked = f.locked;
            status.market_value = f.market_value;
            turned.push((id, f.level));
        }
        let busy = |id: AgentId| {
            let i = turned.iter().position(|(t, _)| *t == id).unwrap();
            agents[i].exiting || agents[i].incapacitated || agents[i].locked
        };

        let config = PopulationConfig::default();
        let ranked = eviction_candidates(&host, region, &turned, &config);
        for candidate in &ranked {
            let i = turned.iter().position(|(t, _)| *t == candidate.agent).unwrap();
            prop_assert!(!agents[i].exiting && !agents[i].incapacitated);
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].value <= pair[1].value);
        }

        let trend = ThreatTrend::with_seed(&TrendConfig::default(), 1.0);
        let scheduler = PopulationScheduler::new(region, 0, trend);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut events = Vec::new();
        let now: Tick = 100;
        let evicted = scheduler.evict(&mut host, now, &turned, excess, &config, &mut rng, &mut events);

        prop_assert!(evicted.len() <= excess);
        prop_assert_eq!(evicted.len(), events.len());
        for id in &evicted {
            prop_assert!(!busy(*id));
        }
    }
}
