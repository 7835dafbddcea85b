//! Per-region population controller
//!
//! Injects groups of turned agents at the map edge when the threat trend
//! allows, and sends the cheapest ones away when the region is over its cap.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{PopulationConfig, TrendConfig};
use crate::core::types::{AgentId, RegionId, Tick};
use crate::host::events::BlightEvent;
use crate::host::Host;
use crate::population::boundary::{nearest_exit, SpawnPointCache};
use crate::population::value::{agent_value, rank, EvictionCandidate};
use crate::threat::environment::ThreatEnvironment;
use crate::threat::trend::ThreatTrend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationScheduler {
    region: RegionId,
    last_spawn: Tick,
    spawn_points: SpawnPointCache,
    trend: ThreatTrend,
}

/// Turned agents in `region` that are still around and not on their way out
pub fn resident_turned<H, F>(host: &H, region: RegionId, level_of: F) -> Vec<(AgentId, u32)>
where
    H: Host + ?Sized,
    F: Fn(AgentId) -> Option<u32>,
{
    host.agents_in_region(region)
        .into_iter()
        .filter_map(|id| level_of(id).map(|level| (id, level)))
        .filter(|(id, _)| host.status(*id).map(|s| !s.exiting && !s.deceased).unwrap_or(false))
        .collect()
}

/// Ranked eviction pool; exiting and incapacitated agents never enter it
pub fn eviction_candidates<H: Host + ?Sized>(
    host: &H,
    region: RegionId,
    turned: &[(AgentId, u32)],
    config: &PopulationConfig,
) -> Vec<EvictionCandidate> {
    let bounds = host.bounds(region);
    let mut candidates: Vec<EvictionCandidate> = turned
        .iter()
        .filter_map(|&(agent, level)| {
            let status = host.status(agent)?;
            if status.exiting || status.incapacitated || status.deceased {
                return None;
            }
            Some(EvictionCandidate {
                agent,
                value: agent_value(status.market_value, status.body_size, level, config),
                edge_distance: bounds.map(|b| b.edge_distance(status.position)).unwrap_or(0),
                locked: status.locked,
            })
        })
        .collect();
    rank(&mut candidates);
    candidates
}

impl PopulationScheduler {
    pub fn new(region: RegionId, now: Tick, trend: ThreatTrend) -> Self {
        Self {
            region,
            last_spawn: now,
            spawn_points: SpawnPointCache::new(now),
            trend,
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn trend(&self) -> &ThreatTrend {
        &self.trend
    }

    pub fn trend_mut(&mut self) -> &mut ThreatTrend {
        &mut self.trend
    }

    pub fn last_spawn(&self) -> Tick {
        self.last_spawn
    }

    pub fn spawn_points(&self) -> &[crate::core::types::Cell] {
        self.spawn_points.points()
    }

    /// One scheduling pass
    ///
    /// The cap check runs every pass; spawning additionally waits for the
    /// minimum interval and never happens while the region is at or over the cap.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<H, F>(
        &mut self,
        host: &mut H,
        now: Tick,
        level_of: F,
        config: &PopulationConfig,
        trend_config: &TrendConfig,
        rng: &mut impl Rng,
        events: &mut Vec<BlightEvent>,
    ) where
        H: Host + ?Sized,
        F: Fn(AgentId) -> Option<u32>,
    {
        let region = self.region;
        if !host.is_home(region) {
            return;
        }

        self.spawn_points
            .refresh(&*host, region, now, config.spawn_point_refresh_interval);

        let turned = resident_turned(&*host, region, &level_of);
        let population = turned.len();
        if population > config.max_population {
            self.evict(&mut *host, now, &turned, population - config.max_population, config, &mut *rng, events);
        }

        if now.saturating_sub(self.last_spawn) < config.min_spawn_interval || population >= config.max_population {
            return;
        }

        let Some(env) = ThreatEnvironment::sample(&*host, region) else {
            tracing::debug!("region {:?}: no outdoor temperature, skipping spawn roll", region);
            return;
        };
        let trend = self.trend.current_value(now, &env, trend_config);
        let chance = trend * config.spawn_chance_scale;
        if rng.gen::<f32>() >= chance {
            return;
        }

        let points = self.spawn_points.points();
        if points.is_empty() {
            return;
        }
        let near = points[rng.gen_range(0..points.len())];
        let (lo, hi) = if trend > config.high_trend_threshold {
            config.high_group_size
        } else {
            config.low_group_size
        };
        let count = rng.gen_range(lo..=hi);

        tracing::info!("region {:?}: requesting {} turned near {:?} (trend {:.2})", region, count, near, trend);
        events.push(BlightEvent::SpawnRequested { region, near, count });
        self.last_spawn = now;
    }

    /// Send up to `excess` of the cheapest turned agents off the map
    ///
    /// Locked agents keep their slot in the selection but are left alone this
    /// pass, as are agents with no reachable exit. Returns evicted agents.
    #[allow(clippy::too_many_arguments)]
    pub fn evict<H: Host + ?Sized>(
        &self,
        host: &mut H,
        now: Tick,
        turned: &[(AgentId, u32)],
        excess: usize,
        config: &PopulationConfig,
        rng: &mut impl Rng,
        events: &mut Vec<BlightEvent>,
    ) -> Vec<AgentId> {
        let region = self.region;
        let candidates = eviction_candidates(&*host, region, turned, config);
        let mut evicted = Vec::new();

        for candidate in candidates.into_iter().take(excess) {
            if candidate.locked {
                continue;
            }
            let Some(position) = host.status(candidate.agent).map(|s| s.position) else {
                continue;
            };
            let Some(exit) = nearest_exit(&*host, region, position) else {
                tracing::debug!("{} has no reachable exit; retrying next pass", candidate.agent);
                continue;
            };
            let depart_at = now + rng.gen_range(config.exit_delay.0..=config.exit_delay.1);
            match host.begin_exit(candidate.agent, exit, depart_at) {
                Ok(()) => {
                    events.push(BlightEvent::EvictRequested {
                        agent: candidate.agent,
                        exit,
                        depart_at,
                    });
                    evicted.push(candidate.agent);
                }
                Err(e) => tracing::warn!("eviction of {} failed: {}", candidate.agent, e),
            }
        }

        if !evicted.is_empty() {
            tracing::info!("region {:?}: evicting {} of {} excess turned", region, evicted.len(), excess);
        }
        evicted
    }
}
