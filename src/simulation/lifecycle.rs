//! Agent lifecycle hooks and per-agent operations
//!
//! Everything the host calls between ticks: exposure, protection, deaths,
//! severity overrides, removal, spawn fulfilment and per-agent queries that
//! need more than one piece of state.

use rand::seq::SliceRandom;

use crate::affliction::additive::EffectPayload;
use crate::affliction::contagion::{self, Exposure};
use crate::affliction::infection::ProtectionOutcome;
use crate::affliction::protection::{ApplyOutcome, ProtectionKind, ProtectionSet};
use crate::affliction::starvation::StarvationTrack;
use crate::affliction::terminal::{Extraction, TerminalEffects};
use crate::core::error::{BlightError, Result};
use crate::core::registry::DefinitionKind;
use crate::core::types::{AgentId, Cell, RegionId, Tick};
use crate::host::events::BlightEvent;
use crate::host::{ActionRange, AgentStatus, Host, HostCondition};
use crate::simulation::world::BlightWorld;
use crate::trace::field::TraceField;
use crate::turned::behavior::TurnedBehavior;
use crate::turned::directive::{think, Directive, ThinkContext};

impl BlightWorld {
    /// Expose `agent` to the infection
    ///
    /// Grows an existing track or starts a new one dampened by resistance.
    pub fn try_infect<H: Host + ?Sized>(&mut self, host: &H, agent: AgentId, initial: Option<f32>, now: Tick) -> Result<Exposure> {
        let status = host.status(agent).ok_or(BlightError::AgentNotFound(agent))?;
        let exposure = self.expose(agent, &status, initial, now);
        if let Exposure::Started(severity) = exposure {
            self.publish(vec![BlightEvent::Infected { agent, severity }]);
        }
        Ok(exposure)
    }

    pub(crate) fn expose(
        &mut self,
        agent: AgentId,
        status: &AgentStatus,
        initial: Option<f32>,
        now: Tick,
    ) -> Exposure {
        if self.registry.require(DefinitionKind::Infection, &mut self.diagnostics).is_none() {
            return Exposure::Blocked(contagion::Susceptibility::Undefined);
        }
        let protections = self.state.protections.get(&agent);
        let susceptibility = contagion::susceptibility(status, protections, self.state.turned.contains_key(&agent));
        let resistance = protections.map(|p| p.resistance_strength()).unwrap_or(0.0);
        let initial = initial.unwrap_or(self.config.contagion.default_initial_severity);
        let exposure = contagion::try_infect(
            &mut self.state.infections,
            agent,
            susceptibility,
            resistance,
            initial,
            now,
            &self.config.contagion,
        );
        match exposure {
            Exposure::Started(severity) => tracing::info!("{} infected at severity {:.3}", agent, severity),
            Exposure::Grew(severity) => tracing::debug!("{} infection grew to {:.3}", agent, severity),
            Exposure::Blocked(reason) => tracing::debug!("{} exposure blocked: {:?}", agent, reason),
        }
        exposure
    }

    /// Grant resistance or immunity
    ///
    /// Deceased agents are ignored. A protection that applies to an existing
    /// infection knocks its severity back and may cure it outright.
    pub fn apply_protection<H: Host + ?Sized>(
        &mut self,
        host: &H,
        agent: AgentId,
        kind: ProtectionKind,
        strength: f32,
        duration: Tick,
    ) -> Result<Vec<BlightEvent>> {
        let status = host.status(agent).ok_or(BlightError::AgentNotFound(agent))?;
        if status.deceased {
            tracing::debug!("{} is dead; ignoring {:?}", agent, kind);
            return Ok(Vec::new());
        }
        let def_kind = match kind {
            ProtectionKind::Resistance => DefinitionKind::Resistance,
            ProtectionKind::Immunity => DefinitionKind::Immunity,
        };
        if self.registry.require(def_kind, &mut self.diagnostics).is_none() {
            return Ok(Vec::new());
        }

        let outcome = self
            .state
            .protections
            .entry(agent)
            .or_insert_with(ProtectionSet::new)
            .apply(kind, strength, duration, &self.config.protection);

        let mut events = Vec::new();
        let ApplyOutcome::Applied { knockback: Some(effectiveness) } = outcome else {
            return Ok(events);
        };
        let Some(track) = self.state.infections.get_mut(&agent) else {
            return Ok(events);
        };
        match track.apply_protection(effectiveness, &self.config.infection) {
            ProtectionOutcome::Reduced(severity) => {
                tracing::debug!("{} infection reduced to {:.3} by {:?}", agent, severity, kind);
            }
            ProtectionOutcome::Cured => {
                self.state.infections.remove(&agent);
                tracing::info!("{} cured by {:?}", agent, kind);
                events.push(BlightEvent::Cured {
                    agent,
                    faction: status.faction,
                });
            }
        }
        Ok(self.publish(events))
    }

    /// Something with an embedded protection was eaten
    pub fn on_ingested<H: Host + ?Sized>(&mut self, host: &H, agent: AgentId, payload: EffectPayload) -> Result<Vec<BlightEvent>> {
        self.apply_protection(host, agent, payload.kind, payload.strength, payload.duration)
    }

    /// The host reports that `agent` has died
    ///
    /// A dying turned agent dies for good; an infected corpse gets its
    /// temperature multiplier recomputed on the next tick.
    pub fn on_agent_died<H: Host + ?Sized>(&mut self, host: &mut H, agent: AgentId, now: Tick) -> Result<Vec<BlightEvent>> {
        let status = host.status(agent).ok_or(BlightError::AgentNotFound(agent))?;
        for emitter in self.emitters.values_mut() {
            emitter.forget(agent);
        }
        if self.state.turned.contains_key(&agent) {
            let events = self.permanent_death(host, agent, status.region, status.position, now);
            return Ok(self.publish(events));
        }
        if let Some(track) = self.state.infections.get_mut(&agent) {
            track.invalidate_multiplier();
            tracing::debug!("{} died while infected at {:.3}", agent, track.severity());
        }
        Ok(Vec::new())
    }

    pub(crate) fn permanent_death<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentId,
        region: RegionId,
        position: Cell,
        now: Tick,
    ) -> Vec<BlightEvent> {
        let Some(behavior) = self.state.turned.remove(&agent) else {
            return Vec::new();
        };
        self.state.starvation.remove(&agent);
        self.state.followers.remove(&agent);

        if let Err(e) = host.set_faction(agent, behavior.original_faction()) {
            tracing::warn!("could not restore faction of {}: {}", agent, e);
        }

        let terminal = self.state.terminal.entry(agent).or_insert_with(TerminalEffects::new);
        if let Some(def) = self.registry.require(DefinitionKind::CorpseTaint, &mut self.diagnostics) {
            terminal.attach_taint(def);
        }
        if let Some(def) = self.registry.require(DefinitionKind::PostTransformWeakness, &mut self.diagnostics) {
            terminal.attach_weakness(def);
        }
        if terminal.is_empty() {
            self.state.terminal.remove(&agent);
        }

        let mut events = vec![BlightEvent::PermanentDeath { agent, region }];
        events.extend(self.death_burst(host, region, position, now));
        tracing::info!("{} died for good at {:?}", agent, position);
        events
    }

    /// Residue on the death cell and a few random neighbours
    fn death_burst<H: Host + ?Sized>(&mut self, host: &mut H, region: RegionId, center: Cell, now: Tick) -> Vec<BlightEvent> {
        if !self.registry.require_residue(&mut self.diagnostics) {
            return Vec::new();
        }
        let Some(bounds) = host.bounds(region) else {
            self.diagnostics.missing_context("region bounds for death burst");
            return Vec::new();
        };

        let mut neighbours: Vec<Cell> = center.neighbors().into_iter().filter(|c| bounds.contains(*c)).collect();
        neighbours.shuffle(&mut self.rng);
        neighbours.truncate(self.config.turned.death_burst_cells);

        let mut events = Vec::new();
        for cell in std::iter::once(center).chain(neighbours) {
            if self.drop_residue(host, region, cell, now) {
                events.push(BlightEvent::ResidueDropped { region, cell });
            }
        }
        events
    }

    /// Place residue and its tainted trace
    pub(crate) fn drop_residue<H: Host + ?Sized>(&mut self, host: &mut H, region: RegionId, cell: Cell, now: Tick) -> bool {
        if !host.place_residue(region, cell) {
            return false;
        }
        let terrain = host.terrain(region, cell);
        if let Some(state) = self.state.regions.get_mut(&region) {
            state
                .traces
                .deposit(cell, self.config.turned.residue_trace_strength, true, now, terrain);
        }
        true
    }

    /// Host override of an affliction's severity
    ///
    /// Zero or below removes the affliction.
    pub fn on_severity_changed(&mut self, agent: AgentId, kind: DefinitionKind, severity: f32) -> Result<()> {
        match kind {
            DefinitionKind::Infection => {
                let track = self.state.infections.get_mut(&agent).ok_or(BlightError::AgentNotFound(agent))?;
                if severity <= 0.0 {
                    self.state.infections.remove(&agent);
                } else {
                    track.set_severity(severity);
                }
            }
            DefinitionKind::Starvation => {
                let track = self.state.starvation.get_mut(&agent).ok_or(BlightError::AgentNotFound(agent))?;
                if severity <= 0.0 {
                    self.state.starvation.remove(&agent);
                } else {
                    track.set_severity(severity);
                }
            }
            other => {
                return Err(BlightError::InvalidConfig(format!("{:?} has no adjustable severity", other)));
            }
        }
        Ok(())
    }

    /// Forget everything about an agent that left the game
    pub fn on_agent_removed(&mut self, agent: AgentId) {
        self.state.infections.remove(&agent);
        self.state.protections.remove(&agent);
        self.state.turned.remove(&agent);
        self.state.starvation.remove(&agent);
        self.state.terminal.remove(&agent);
        self.state.followers.remove(&agent);
        for emitter in self.emitters.values_mut() {
            emitter.forget(agent);
        }
        tracing::debug!("{} removed", agent);
    }

    /// Turn `agent`: switch faction, revive, strip conditions, attach hunger
    ///
    /// Returns false when a required definition is missing or the agent is
    /// already turned; the agent is left untouched in that case. No event is
    /// published; infection-driven transforms report `Transformed` from the tick.
    pub fn turn<H: Host + ?Sized>(&mut self, host: &mut H, agent: AgentId, now: Tick) -> Result<bool> {
        let status = host.status(agent).ok_or(BlightError::AgentNotFound(agent))?;
        if self.state.turned.contains_key(&agent) {
            return Ok(false);
        }
        if self.registry.require(DefinitionKind::TurnedState, &mut self.diagnostics).is_none() {
            return Ok(false);
        }
        let Some(hostile) = self.registry.require_hostile_faction(&mut self.diagnostics) else {
            return Ok(false);
        };

        for condition in HostCondition::DISQUALIFYING {
            if host.has_condition(agent, condition) {
                host.remove_condition(agent, condition)?;
            }
        }
        host.set_faction(agent, Some(hostile))?;
        if status.deceased {
            if let Err(e) = host.reanimate(agent) {
                if let Err(restore) = host.set_faction(agent, status.faction) {
                    tracing::warn!("could not restore faction of {}: {}", agent, restore);
                }
                return Err(e);
            }
        }

        self.state.infections.remove(&agent);
        self.state
            .turned
            .insert(agent, TurnedBehavior::new(status.faction, now, &self.config.turned, &mut self.rng));
        if let Some(def) = self.registry.require(DefinitionKind::Starvation, &mut self.diagnostics) {
            let track = StarvationTrack::new(def.initial_severity, now, &self.config.starvation);
            self.state.starvation.insert(agent, track);
        }
        for emitter in self.emitters.values_mut() {
            emitter.forget(agent);
        }
        Ok(true)
    }

    /// Bring a requested group into the region
    ///
    /// Each member is spawned by the host near `near` and turned on arrival.
    pub fn fulfil_spawn<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        region: RegionId,
        near: Cell,
        count: u32,
        now: Tick,
    ) -> Result<Vec<AgentId>> {
        let mut spawned = Vec::new();
        for _ in 0..count {
            let Some(agent) = host.spawn_agent(region, near, self.config.population.spawn_scatter_radius) else {
                tracing::debug!("region {:?}: no room to spawn near {:?}", region, near);
                continue;
            };
            if self.turn(host, agent, now)? {
                spawned.push(agent);
            }
        }
        if !spawned.is_empty() {
            tracing::info!("region {:?}: {} turned arrived near {:?}", region, spawned.len(), near);
        }
        Ok(spawned)
    }

    pub fn set_level(&mut self, agent: AgentId, level: u32) -> Result<()> {
        let behavior = self.state.turned.get_mut(&agent).ok_or(BlightError::AgentNotFound(agent))?;
        behavior.set_level(level);
        Ok(())
    }

    /// Whether a turned agent may perform an action of `range`; None if not turned
    pub fn allows_action(&self, agent: AgentId, range: ActionRange) -> Option<bool> {
        self.state.turned.get(&agent).map(|b| b.allows_action(range))
    }

    /// Feed a turned agent; returns whether hunger was fully satisfied
    pub fn feed(&mut self, agent: AgentId, amount: f32) -> Result<bool> {
        let track = self.state.starvation.get_mut(&agent).ok_or(BlightError::AgentNotFound(agent))?;
        let satisfied = track.feed(amount);
        if satisfied {
            self.state.starvation.remove(&agent);
        }
        Ok(satisfied)
    }

    /// Harvest residue from a permanently dead corpse
    pub fn extract_residue(&mut self, agent: AgentId) -> (Extraction, Vec<BlightEvent>) {
        let Some(effects) = self.state.terminal.get_mut(&agent) else {
            return (Extraction::Empty, Vec::new());
        };
        let extraction = effects.extract(&self.config.terminal);
        if effects.is_empty() {
            self.state.terminal.remove(&agent);
        }
        let events = match extraction {
            Extraction::Depleted => self.publish(vec![BlightEvent::TaintDepleted { agent }]),
            _ => Vec::new(),
        };
        (extraction, events)
    }

    /// Next directive for a turned agent
    pub fn think<H: Host + ?Sized>(&mut self, host: &mut H, agent: AgentId, now: Tick) -> Result<Directive> {
        let status = host.status(agent).ok_or(BlightError::AgentNotFound(agent))?;
        let behavior = self.state.turned.get(&agent).ok_or(BlightError::AgentNotFound(agent))?;
        let region = status.region;
        let Some(region_state) = self.state.regions.get_mut(&region) else {
            return Err(BlightError::RegionNotFound(region));
        };

        let mut follower = self.state.followers.remove(&agent);
        let ctx = ThinkContext {
            behavior,
            follower: &mut follower,
            field: &mut region_state.traces,
            config: &self.config.turned,
            rng: &mut self.rng,
        };
        let directive = think(host, region, agent, now, ctx);
        if let Some(follower) = follower {
            self.state.followers.insert(agent, follower);
        }
        Ok(directive)
    }

    pub fn traces_mut(&mut self, region: RegionId) -> Option<&mut TraceField> {
        self.state.regions.get_mut(&region).map(|r| &mut r.traces)
    }
}
