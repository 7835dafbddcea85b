//! Blight Sim - headless sandbox run
//!
//! Builds a single home region with settlers and a few infected corpses,
//! then drives the blight core tick by tick. Movement and fighting are
//! crude stand-ins for what a real host game would do.

use std::path::PathBuf;

use blight_sim::core::clock::SimClock;
use blight_sim::core::error::Result;
use blight_sim::core::types::{AgentId, Cell, FactionId, RegionBounds, RegionId, Tick};
use blight_sim::core::{BlightConfig, DefinitionRegistry};
use blight_sim::host::events::{BlightEvent, EventTally};
use blight_sim::host::sandbox::SandboxHost;
use blight_sim::host::{AgentDirectory, SpatialQuery, WeatherKind};
use blight_sim::simulation::BlightWorld;
use blight_sim::turned::Directive;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const SETTLERS: FactionId = FactionId(1);
const BLIGHT: FactionId = FactionId(66);

/// Headless blight sandbox
#[derive(Parser, Debug)]
#[command(name = "blight-sim")]
#[command(about = "Run the blight core against a sandbox host and report what happened")]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 60_000)]
    ticks: u64,

    /// Random seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Living settlers placed at the start
    #[arg(long, default_value_t = 12)]
    settlers: usize,

    /// Infected corpses placed at the start
    #[arg(long, default_value_t = 3)]
    corpses: usize,

    /// Region width and height in cells
    #[arg(long, default_value_t = 60)]
    size: i32,

    /// Ticks between movement steps
    #[arg(long, default_value_t = 60)]
    step_interval: u64,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    settlers_alive: usize,
    turned: usize,
    infected: usize,
    residue: usize,
    trend: f32,
    tally: EventTally,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blight_sim=info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BlightConfig::load(path)?,
        None => BlightConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut host = SandboxHost::new();
    let region = host.add_region(RegionBounds::new(args.size, args.size), true);
    host.set_outdoor_temperature(region, 14.0);
    host.set_weather(region, WeatherKind::Fog);

    let mut world = BlightWorld::new(config, DefinitionRegistry::standard(BLIGHT))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);
    let mut tally = EventTally::default();

    populate(&mut world, &mut host, region, &args, &mut rng)?;
    tracing::info!(
        "blight sandbox: {} settlers, {} corpses, seed {}",
        args.settlers,
        args.corpses,
        seed
    );

    let mut clock = SimClock::new();
    while clock.now() < args.ticks {
        let now = clock.advance();
        let events = world.tick(&mut host, now);
        handle_events(&mut world, &mut host, &events, now, &mut tally)?;

        for agent in host.depart_due(now) {
            world.on_agent_removed(agent);
        }

        if now % args.step_interval == 0 {
            step_turned(&mut world, &mut host, region, now, &mut rng, &mut tally)?;
            step_settlers(&mut host, region, &world, &mut rng);
        }
    }

    let summary = RunSummary {
        seed,
        ticks: args.ticks,
        settlers_alive: host
            .agents_in_region(region)
            .into_iter()
            .filter(|id| !world.is_turned(*id))
            .filter(|id| host.status(*id).map(|s| !s.deceased).unwrap_or(false))
            .count(),
        turned: world.turned_count(),
        infected: world.infected_count(),
        residue: host.residue_count(region),
        trend: world.trend(region).map(|t| t.value()).unwrap_or(0.0),
        tally,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("=== BLIGHT SANDBOX ===");
        println!("Seed: {}  Ticks: {}", summary.seed, summary.ticks);
        println!("Settlers alive: {}", summary.settlers_alive);
        println!("Turned: {}  Infected: {}", summary.turned, summary.infected);
        println!("Residue cells: {}  Trend: {:.2}", summary.residue, summary.trend);
        println!("{:#?}", summary.tally);
    }
    Ok(())
}

fn random_cell(bounds: RegionBounds, rng: &mut impl Rng) -> Cell {
    Cell::new(rng.gen_range(1..bounds.width - 1), rng.gen_range(1..bounds.height - 1))
}

fn populate(
    world: &mut BlightWorld,
    host: &mut SandboxHost,
    region: RegionId,
    args: &Args,
    rng: &mut impl Rng,
) -> Result<()> {
    let bounds = RegionBounds::new(args.size, args.size);
    world.ensure_region(region, 0);

    for _ in 0..args.settlers {
        let id = host.add_agent(region, random_cell(bounds, rng));
        host.set_faction(id, Some(SETTLERS))?;
    }
    for _ in 0..args.corpses {
        let id = host.add_agent(region, random_cell(bounds, rng));
        host.set_faction(id, Some(SETTLERS))?;
        world.try_infect(&*host, id, Some(0.6), 0)?;
        host.kill(id)?;
        world.on_agent_died(&mut *host, id, 0)?;
    }
    Ok(())
}

fn handle_events(
    world: &mut BlightWorld,
    host: &mut SandboxHost,
    events: &[BlightEvent],
    now: Tick,
    tally: &mut EventTally,
) -> Result<()> {
    for event in events {
        tally.record(event);
        if let BlightEvent::SpawnRequested { region, near, count } = event {
            world.fulfil_spawn(&mut *host, *region, *near, *count, now)?;
        }
    }
    Ok(())
}

/// One cell toward `to`, if walkable
fn step_toward(host: &SandboxHost, region: RegionId, from: Cell, to: Cell) -> Option<Cell> {
    let next = from.offset((to.x - from.x).signum(), (to.z - from.z).signum());
    (next != from && host.is_walkable(region, next)).then_some(next)
}

fn step_turned(
    world: &mut BlightWorld,
    host: &mut SandboxHost,
    region: RegionId,
    now: Tick,
    rng: &mut impl Rng,
    tally: &mut EventTally,
) -> Result<()> {
    for agent in world.turned_agents() {
        let Some(status) = host.status(agent) else {
            continue;
        };
        let Ok(directive) = world.think(&mut *host, agent, now) else {
            continue;
        };
        let Some(destination) = directive.destination(&*host) else {
            if let Some(s) = host.status_mut(agent) {
                s.moving = false;
            }
            continue;
        };

        if let Directive::Attack(target) = directive {
            if status.position.distance(&destination) <= 1.5 {
                bite(world, &mut *host, agent, target, now, rng, tally)?;
                continue;
            }
        }
        if let Some(next) = step_toward(host, region, status.position, destination) {
            host.move_agent(agent, next)?;
        }
        if let Some(s) = host.status_mut(agent) {
            s.moving = true;
        }
    }
    Ok(())
}

/// Crude melee exchange between a turned attacker and its target
fn bite(
    world: &mut BlightWorld,
    host: &mut SandboxHost,
    attacker: AgentId,
    target: AgentId,
    now: Tick,
    rng: &mut impl Rng,
    tally: &mut EventTally,
) -> Result<()> {
    if rng.gen_bool(0.5) {
        host.add_injury(target, 0.2)?;
        world.try_infect(&*host, target, None, now)?;
        if let Some(s) = host.status_mut(target) {
            s.bleeding = true;
        }
        if host.injuries(target).iter().sum::<f32>() >= 1.0 {
            host.kill(target)?;
            for event in world.on_agent_died(&mut *host, target, now)? {
                tally.record(&event);
            }
        }
    } else if rng.gen_bool(0.1) {
        host.kill(attacker)?;
        for event in world.on_agent_died(&mut *host, attacker, now)? {
            tally.record(&event);
        }
    }
    Ok(())
}

fn step_settlers(host: &mut SandboxHost, region: RegionId, world: &BlightWorld, rng: &mut impl Rng) {
    for agent in host.agents_in_region(region) {
        if world.is_turned(agent) {
            continue;
        }
        let Some(status) = host.status(agent) else {
            continue;
        };
        if status.deceased {
            continue;
        }
        let next = status.position.offset(rng.gen_range(-1..=1), rng.gen_range(-1..=1));
        let moved = next != status.position && host.is_walkable(region, next);
        if moved && host.move_agent(agent, next).is_err() {
            continue;
        }
        if let Some(s) = host.status_mut(agent) {
            s.moving = moved;
        }
    }
}
