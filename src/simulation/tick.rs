//! Simulation tick - one ordered pass over every blight system

use rand::Rng;

use crate::affliction::contagion::{self, Exposure};
use crate::affliction::infection::{InfectionInput, TrackStatus};
use crate::core::registry::DefinitionKind;
use crate::core::types::{AgentId, Cell, RegionId, Tick};
use crate::host::events::BlightEvent;
use crate::host::Host;
use crate::simulation::world::{sorted_keys, BlightWorld};
use crate::threat::environment::ThreatEnvironment;
use crate::turned::behavior::{heal_amount, heal_one};
use crate::turned::hunt::{alert_nearby, find_victim};

impl BlightWorld {
    /// Advance every system by one tick; see [`run_blight_tick`]
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H, now: Tick) -> Vec<BlightEvent> {
        run_blight_tick(self, host, now)
    }
}

/// Run a single blight tick
///
/// Systems run in a fixed order and every per-agent loop walks agents in id
/// order, so a seeded world replays identically.
pub fn run_blight_tick<H: Host + ?Sized>(world: &mut BlightWorld, host: &mut H, now: Tick) -> Vec<BlightEvent> {
    let mut events = Vec::new();

    let regions = host.regions();
    for region in &regions {
        world.ensure_region(*region, now);
    }

    decay_traces(world, now);
    emit_living_traces(world, &*host, &regions, now);
    tick_protections(world, now);
    check_residue_contact(world, &*host, &regions, now, &mut events);
    tick_infections(world, host, now, &mut events);
    tick_turned(world, host, now, &mut events);
    tick_starvation(world, &*host, now, &mut events);
    tick_terminal(world);
    run_schedulers(world, host, &regions, now, &mut events);

    world.state.last_tick = Some(now);
    if !events.is_empty() {
        tracing::debug!("tick {}: {} events", now, events.len());
    }
    world.publish(events)
}

fn decay_traces(world: &mut BlightWorld, now: Tick) {
    let interval = world.config.trace.decay_interval;
    for (region, state) in world.state.regions.iter_mut() {
        if !state.decay_timer.is_due(now) {
            continue;
        }
        state.decay_timer.rearm(now, interval);
        let removed = state.traces.decay_pass(now);
        if removed > 0 {
            tracing::debug!("region {:?}: {} traces faded", region, removed);
        }
    }
}

fn emit_living_traces<H: Host + ?Sized>(world: &mut BlightWorld, host: &H, regions: &[RegionId], now: Tick) {
    let turned = &world.state.turned;
    for region in regions {
        let (Some(emitter), Some(state)) = (world.emitters.get_mut(region), world.state.regions.get_mut(region)) else {
            continue;
        };
        emitter.tick(host, *region, &mut state.traces, now, &world.config.trace, |id| {
            turned.contains_key(&id)
        });
    }
}

fn tick_protections(world: &mut BlightWorld, now: Tick) {
    let elapsed = world.state.last_tick.map(|t| now.saturating_sub(t)).unwrap_or(1);
    if elapsed == 0 {
        return;
    }
    for agent in sorted_keys(&world.state.protections) {
        let Some(set) = world.state.protections.get_mut(&agent) else {
            continue;
        };
        for kind in set.tick(elapsed) {
            tracing::debug!("{} lost {:?}", agent, kind);
        }
        if set.is_empty() {
            world.state.protections.remove(&agent);
        }
    }
}

/// Living agents standing on residue may catch the infection
fn check_residue_contact<H: Host + ?Sized>(
    world: &mut BlightWorld,
    host: &H,
    regions: &[RegionId],
    now: Tick,
    events: &mut Vec<BlightEvent>,
) {
    if !world.state.contact_timer.is_due(now) {
        return;
    }
    world
        .state
        .contact_timer
        .rearm(now, world.config.contagion.contact_check_interval);
    if !world.registry.has_residue() {
        return;
    }

    for region in regions {
        for agent in host.agents_in_region(*region) {
            let Some(status) = host.status(agent) else {
                continue;
            };
            if status.deceased || !host.has_residue(*region, status.position) {
                continue;
            }
            let resistance = world
                .state
                .protections
                .get(&agent)
                .map(|p| p.resistance_strength())
                .unwrap_or(0.0);
            let chance = contagion::residue_contact_chance(resistance, &world.config.contagion);
            if world.rng.gen::<f32>() >= chance {
                continue;
            }
            let severity = world.config.contagion.residue_infection_severity;
            if let Exposure::Started(severity) = world.expose(agent, &status, Some(severity), now) {
                events.push(BlightEvent::Infected { agent, severity });
            }
        }
    }
}

fn tick_infections<H: Host + ?Sized>(world: &mut BlightWorld, host: &mut H, now: Tick, events: &mut Vec<BlightEvent>) {
    if world.state.infections.is_empty() {
        return;
    }
    let Some(rate) = world
        .registry
        .require(DefinitionKind::Infection, &mut world.diagnostics)
        .map(|def| def.severity_per_day)
    else {
        return;
    };

    for agent in sorted_keys(&world.state.infections) {
        let Some(status) = host.status(agent) else {
            world.diagnostics.missing_context("infection owner");
            continue;
        };
        let Some(ambient_temperature) = host.temperature(status.region, status.position) else {
            world.diagnostics.missing_context("infection temperature");
            continue;
        };
        let input = InfectionInput {
            ambient_temperature,
            comfort: status.comfort,
            deceased: status.deceased,
            on_residue: host.has_residue(status.region, status.position),
        };
        let Some(track) = world.state.infections.get_mut(&agent) else {
            continue;
        };
        if track.tick(now, &input, rate, &world.config.infection) != TrackStatus::Transform {
            continue;
        }

        match world.turn(host, agent, now) {
            Ok(true) => {
                tracing::info!("{} rose as turned in {:?}", agent, status.region);
                events.push(BlightEvent::Transformed {
                    agent,
                    region: status.region,
                });
            }
            // Track stays in place; the turn is retried next tick
            Ok(false) => tracing::debug!("{} reached full infection but could not turn", agent),
            Err(e) => {
                world.diagnostics.missing_context("turn");
                tracing::debug!("turning {} failed: {}", agent, e);
            }
        }
    }
}

fn tick_turned<H: Host + ?Sized>(world: &mut BlightWorld, host: &mut H, now: Tick, events: &mut Vec<BlightEvent>) {
    for agent in sorted_keys(&world.state.turned) {
        let Some(status) = host.status(agent) else {
            world.diagnostics.missing_context("turned owner");
            continue;
        };
        let region = status.region;
        if status.deceased {
            events.extend(world.permanent_death(host, agent, region, status.position, now));
            continue;
        }

        let Some(behavior) = world.state.turned.get_mut(&agent) else {
            continue;
        };
        let heal = behavior.heal_due(now, &world.config.turned);
        let check = behavior.check_due(now, &world.config.turned, &mut world.rng);
        if check {
            match host.temperature(region, status.position) {
                Some(temperature) => {
                    if let Some(hibernating) = behavior.update_hibernation(temperature, status.comfort, &world.config.turned)
                    {
                        tracing::debug!("{} hibernating: {}", agent, hibernating);
                        events.push(BlightEvent::HibernationChanged { agent, hibernating });
                    }
                }
                None => world.diagnostics.missing_context("turned temperature"),
            }
        }
        if behavior.is_hibernating() {
            continue;
        }

        if heal {
            heal_injury(world, host, agent);
        }
        if !check || !status.is_capable() || status.exiting {
            continue;
        }

        if status.moving && world.rng.gen::<f32>() < world.config.turned.residue_chance {
            if world.registry.require_residue(&mut world.diagnostics) && world.drop_residue(host, region, status.position, now) {
                events.push(BlightEvent::ResidueDropped {
                    region,
                    cell: status.position,
                });
            }
        }

        if host.current_target(agent).is_none() {
            if let Some(event) = hunt(world, host, agent, region, status.position) {
                events.push(event);
            }
        }
    }
}

fn heal_injury<H: Host + ?Sized>(world: &mut BlightWorld, host: &mut H, agent: AgentId) {
    let injuries = host.injuries(agent);
    let hunger = world.state.starvation.get(&agent).map(|s| s.severity());
    let amount = heal_amount(&world.config.turned, hunger);
    if let Some((index, severity)) = heal_one(&injuries, amount, &mut world.rng) {
        if let Err(e) = host.set_injury_severity(agent, index, severity) {
            tracing::debug!("heal of {} skipped: {}", agent, e);
        }
    }
}

/// Search for prey and share it with idle pack members
fn hunt<H: Host + ?Sized>(
    world: &mut BlightWorld,
    host: &mut H,
    agent: AgentId,
    region: RegionId,
    position: Cell,
) -> Option<BlightEvent> {
    let hostile = world.registry.require_hostile_faction(&mut world.diagnostics)?;
    let turned = &world.state.turned;
    let protections = &world.state.protections;
    let config = &world.config.turned;

    let target = find_victim(&*host, region, agent, position, hostile, config.victim_search_radius, |id| {
        turned.contains_key(&id) || protections.get(&id).map(|p| p.is_immune()).unwrap_or(false)
    })?;
    if let Err(e) = host.set_target(agent, Some(target)) {
        tracing::debug!("{} could not target {}: {}", agent, target, e);
        return None;
    }
    let alerted = alert_nearby(&mut *host, region, agent, position, target, config.alert_radius, |id| {
        turned.get(&id).map(|b| !b.is_hibernating()).unwrap_or(false)
    });
    tracing::debug!("{} hunting {} with {} alerted", agent, target, alerted.len());
    Some(BlightEvent::TargetAcquired { agent, target, alerted })
}

fn tick_starvation<H: Host + ?Sized>(world: &mut BlightWorld, host: &H, now: Tick, events: &mut Vec<BlightEvent>) {
    if world.state.starvation.is_empty() {
        return;
    }
    let Some(rate) = world
        .registry
        .require(DefinitionKind::Starvation, &mut world.diagnostics)
        .map(|def| def.severity_per_day)
    else {
        return;
    };

    for agent in sorted_keys(&world.state.starvation) {
        let Some(status) = host.status(agent) else {
            world.diagnostics.missing_context("starvation owner");
            continue;
        };
        let Some(temperature) = host.temperature(status.region, status.position) else {
            world.diagnostics.missing_context("starvation temperature");
            continue;
        };
        let Some(track) = world.state.starvation.get_mut(&agent) else {
            continue;
        };
        if let Some(effect) = track.tick(now, temperature, rate, &world.config.starvation, &mut world.rng) {
            events.push(BlightEvent::StarvationEffect { agent, effect });
        }
    }
}

fn tick_terminal(world: &mut BlightWorld) {
    world.state.terminal.retain(|_, effects| {
        effects.tick();
        !effects.is_empty()
    });
}

fn run_schedulers<H: Host + ?Sized>(
    world: &mut BlightWorld,
    host: &mut H,
    regions: &[RegionId],
    now: Tick,
    events: &mut Vec<BlightEvent>,
) {
    let turned = &world.state.turned;
    let level_of = |id: AgentId| turned.get(&id).map(|b| b.level());
    for region in regions {
        let Some(state) = world.state.regions.get_mut(region) else {
            continue;
        };
        if let Some(env) = ThreatEnvironment::sample(&*host, *region) {
            state.scheduler.trend_mut().update(now, &env, &world.config.trend);
        }
        state.scheduler.tick(
            &mut *host,
            now,
            &level_of,
            &world.config.population,
            &world.config.trend,
            &mut world.rng,
            events,
        );
    }
}
