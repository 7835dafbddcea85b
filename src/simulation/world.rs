//! Owner of all blight state
//!
//! Per-agent state lives in maps keyed by `AgentId`; per-region state (the
//! scheduler with its trend, and the trace field) in maps keyed by
//! `RegionId`. Everything persisted sits in `BlightState`, which serializes to
//! JSON. Emitters, observers, diagnostics and the random stream are runtime-only.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::affliction::infection::InfectionTrack;
use crate::affliction::protection::ProtectionSet;
use crate::affliction::starvation::StarvationTrack;
use crate::affliction::terminal::TerminalEffects;
use crate::core::clock::IntervalTimer;
use crate::core::config::BlightConfig;
use crate::core::diagnostics::Diagnostics;
use crate::core::error::{BlightError, Result};
use crate::core::registry::DefinitionRegistry;
use crate::core::types::{AgentId, RegionId, Tick};
use crate::host::events::{BlightEvent, BlightObserver};
use crate::population::scheduler::PopulationScheduler;
use crate::threat::trend::{ThreatTrend, TrendSample};
use crate::trace::emitter::LivingEmitter;
use crate::trace::field::TraceField;
use crate::trace::follow::TraceFollower;
use crate::turned::behavior::TurnedBehavior;

/// State owned by one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionState {
    pub scheduler: PopulationScheduler,
    pub traces: TraceField,
    pub decay_timer: IntervalTimer,
}

/// Everything that survives a save/load cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlightState {
    pub infections: AHashMap<AgentId, InfectionTrack>,
    pub protections: AHashMap<AgentId, ProtectionSet>,
    pub turned: AHashMap<AgentId, TurnedBehavior>,
    pub starvation: AHashMap<AgentId, StarvationTrack>,
    pub terminal: AHashMap<AgentId, TerminalEffects>,
    pub followers: AHashMap<AgentId, TraceFollower>,
    pub regions: AHashMap<RegionId, RegionState>,
    pub contact_timer: IntervalTimer,
    pub last_tick: Option<Tick>,
}

impl BlightState {
    fn new(config: &BlightConfig) -> Self {
        Self {
            infections: AHashMap::new(),
            protections: AHashMap::new(),
            turned: AHashMap::new(),
            starvation: AHashMap::new(),
            terminal: AHashMap::new(),
            followers: AHashMap::new(),
            regions: AHashMap::new(),
            contact_timer: IntervalTimer::armed_at(config.contagion.contact_check_interval),
            last_tick: None,
        }
    }
}

/// Keys of an agent map in a stable order, so random draws replay identically
pub(crate) fn sorted_keys<V>(map: &AHashMap<AgentId, V>) -> Vec<AgentId> {
    let mut keys: Vec<AgentId> = map.keys().copied().collect();
    keys.sort();
    keys
}

pub struct BlightWorld {
    pub(crate) config: BlightConfig,
    pub(crate) registry: DefinitionRegistry,
    pub(crate) state: BlightState,
    pub(crate) emitters: AHashMap<RegionId, LivingEmitter>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) rng: ChaCha8Rng,
    observers: Vec<Box<dyn BlightObserver>>,
}

impl std::fmt::Debug for BlightWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlightWorld")
            .field("infections", &self.state.infections.len())
            .field("turned", &self.state.turned.len())
            .field("regions", &self.state.regions.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl BlightWorld {
    /// Create a world; fails if the config is inconsistent
    pub fn new(config: BlightConfig, registry: DefinitionRegistry) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let state = BlightState::new(&config);
        Ok(Self {
            config,
            registry,
            state,
            emitters: AHashMap::new(),
            diagnostics: Diagnostics::new(),
            rng,
            observers: Vec::new(),
        })
    }

    pub fn config(&self) -> &BlightConfig {
        &self.config
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn state(&self) -> &BlightState {
        &self.state
    }

    pub fn add_observer(&mut self, observer: Box<dyn BlightObserver>) {
        self.observers.push(observer);
    }

    /// Push events to observers and hand them back
    pub(crate) fn publish(&mut self, events: Vec<BlightEvent>) -> Vec<BlightEvent> {
        for observer in self.observers.iter_mut() {
            for event in &events {
                observer.on_event(event);
            }
        }
        events
    }

    // === Queries ===

    pub fn infection(&self, agent: AgentId) -> Option<&InfectionTrack> {
        self.state.infections.get(&agent)
    }

    pub fn protections(&self, agent: AgentId) -> Option<&ProtectionSet> {
        self.state.protections.get(&agent)
    }

    pub fn turned(&self, agent: AgentId) -> Option<&TurnedBehavior> {
        self.state.turned.get(&agent)
    }

    pub fn is_turned(&self, agent: AgentId) -> bool {
        self.state.turned.contains_key(&agent)
    }

    /// Turned agents in id order
    pub fn turned_agents(&self) -> Vec<AgentId> {
        sorted_keys(&self.state.turned)
    }

    pub fn turned_count(&self) -> usize {
        self.state.turned.len()
    }

    pub fn infected_count(&self) -> usize {
        self.state.infections.len()
    }

    pub fn starvation(&self, agent: AgentId) -> Option<&StarvationTrack> {
        self.state.starvation.get(&agent)
    }

    pub fn terminal_effects(&self, agent: AgentId) -> Option<&TerminalEffects> {
        self.state.terminal.get(&agent)
    }

    pub fn region(&self, region: RegionId) -> Option<&RegionState> {
        self.state.regions.get(&region)
    }

    pub fn traces(&self, region: RegionId) -> Option<&TraceField> {
        self.state.regions.get(&region).map(|r| &r.traces)
    }

    pub fn trend(&self, region: RegionId) -> Option<&ThreatTrend> {
        self.state.regions.get(&region).map(|r| r.scheduler.trend())
    }

    /// Hourly outlook for a region's trend
    pub fn forecast(&self, region: RegionId, now: Tick, steps: usize) -> Result<Vec<TrendSample>> {
        let trend = self.trend(region).ok_or(BlightError::RegionNotFound(region))?;
        Ok(trend.forecast(now, steps, &self.config.trend))
    }

    // === Region bookkeeping ===

    /// Create region state on first sight
    pub fn ensure_region(&mut self, region: RegionId, now: Tick) {
        if self.state.regions.contains_key(&region) {
            return;
        }
        let trend = ThreatTrend::new(&self.config.trend, &mut self.rng);
        tracing::debug!("region {:?}: tracking with trend seed {:.1}", region, trend.seed());
        self.state.regions.insert(
            region,
            RegionState {
                scheduler: PopulationScheduler::new(region, now, trend),
                traces: TraceField::new(&self.config.trace),
                decay_timer: IntervalTimer::armed_at(now + self.config.trace.decay_interval),
            },
        );
        self.emitters.insert(region, LivingEmitter::new(now));
    }

    /// Stop tracking a region and everything in it
    pub fn remove_region(&mut self, region: RegionId) -> Result<()> {
        self.state
            .regions
            .remove(&region)
            .ok_or(BlightError::RegionNotFound(region))?;
        self.emitters.remove(&region);
        Ok(())
    }

    // === Persistence ===

    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Rebuild a world from a snapshot
    ///
    /// The random stream restarts from the config seed mixed with the last
    /// processed tick; living-agent emitters restart empty.
    pub fn restore(config: BlightConfig, registry: DefinitionRegistry, json: &str) -> Result<Self> {
        let state: BlightState = serde_json::from_str(json)?;
        let mut world = Self::new(config, registry)?;
        world.rng = ChaCha8Rng::seed_from_u64(world.config.seed ^ state.last_tick.unwrap_or(0));
        let now = state.last_tick.unwrap_or(0);
        world.emitters = state.regions.keys().map(|r| (*r, LivingEmitter::new(now))).collect();
        world.state = state;
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FactionId;

    fn world() -> BlightWorld {
        BlightWorld::new(BlightConfig::default(), DefinitionRegistry::standard(FactionId(66))).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = BlightConfig::default();
        config.trend.update_interval = 0;
        let result = BlightWorld::new(config, DefinitionRegistry::new());
        assert!(matches!(result, Err(BlightError::InvalidConfig(_))));
    }

    #[test]
    fn test_ensure_region_once() {
        let mut world = world();
        world.ensure_region(RegionId(3), 10);
        let seed = world.trend(RegionId(3)).unwrap().seed();
        world.ensure_region(RegionId(3), 20);
        assert_eq!(world.trend(RegionId(3)).unwrap().seed(), seed);
        assert!(world.forecast(RegionId(3), 20, 8).unwrap().len() == 8);
        assert!(matches!(world.forecast(RegionId(4), 20, 8), Err(BlightError::RegionNotFound(_))));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut world = world();
        world.ensure_region(RegionId(0), 0);
        world
            .state
            .infections
            .insert(AgentId::from_index(1), InfectionTrack::new(0.4, 12));
        let json = world.snapshot().unwrap();

        let restored = BlightWorld::restore(
            BlightConfig::default(),
            DefinitionRegistry::standard(FactionId(66)),
            &json,
        )
        .unwrap();
        assert_eq!(restored.state(), world.state());
    }

    #[test]
    fn test_remove_region() {
        let mut world = world();
        world.ensure_region(RegionId(1), 0);
        assert!(world.remove_region(RegionId(1)).is_ok());
        assert!(world.remove_region(RegionId(1)).is_err());
    }
}
