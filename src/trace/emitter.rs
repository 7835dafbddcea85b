//! Scent left by living agents as they move around

use ahash::{AHashMap, AHashSet};

use crate::core::clock::IntervalTimer;
use crate::core::config::TraceConfig;
use crate::core::types::{AgentId, RegionId, Tick};
use crate::host::Host;
use crate::trace::field::TraceField;

/// Per-region emitter; runtime-only state
#[derive(Debug, Clone)]
pub struct LivingEmitter {
    timer: IntervalTimer,
    last_deposit: AHashMap<AgentId, Tick>,
}

impl LivingEmitter {
    pub fn new(now: Tick) -> Self {
        Self {
            timer: IntervalTimer::armed_at(now),
            last_deposit: AHashMap::new(),
        }
    }

    /// Agents with a recorded deposit
    pub fn tracked(&self) -> usize {
        self.last_deposit.len()
    }

    pub fn forget(&mut self, agent: AgentId) {
        self.last_deposit.remove(&agent);
    }

    /// Deposit for every eligible living agent when the pulse is due
    ///
    /// Agents no longer in the region are dropped from the spacing record.
    /// Returns the number of deposits made.
    pub fn tick<H, F>(
        &mut self,
        host: &H,
        region: RegionId,
        field: &mut TraceField,
        now: Tick,
        config: &TraceConfig,
        is_turned: F,
    ) -> usize
    where
        H: Host + ?Sized,
        F: Fn(AgentId) -> bool,
    {
        if !self.timer.is_due(now) {
            return 0;
        }
        self.timer.rearm(now, config.living_deposit_interval);

        let present: AHashSet<AgentId> = host.agents_in_region(region).into_iter().collect();
        self.last_deposit.retain(|agent, _| present.contains(agent));

        let mut deposits = 0;
        for agent in host.agents_in_region(region) {
            let Some(status) = host.status(agent) else {
                continue;
            };
            if !status.is_capable() || !status.flesh || is_turned(agent) {
                continue;
            }
            if let Some(&last) = self.last_deposit.get(&agent) {
                if now.saturating_sub(last) < config.min_deposit_spacing {
                    continue;
                }
            }

            let strength = if status.bleeding {
                config.living_strength * config.bleeding_multiplier
            } else {
                config.living_strength
            };
            let terrain = host.terrain(region, status.position);
            if field.deposit(status.position, strength, false, now, terrain) {
                deposits += 1;
            }
            self.last_deposit.insert(agent, now);
        }
        deposits
    }
}
