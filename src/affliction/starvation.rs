//! Hunger of turned agents
//!
//! Grows slowly, faster in heat and slower in cold. Past the critical
//! threshold it periodically triggers a disruptive effect. Its severity is
//! also the penalty applied to auto-heal.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::clock::{per_tick, IntervalTimer};
use crate::core::config::StarvationConfig;
use crate::core::types::Tick;

/// Disruption rolled while critically starved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarvationEffect {
    Stun,
    Frenzy,
    SelfDamage,
}

/// Rate scale for the ambient temperature
pub fn temperature_factor(temperature: f32, config: &StarvationConfig) -> f32 {
    if temperature > config.hot_threshold {
        1.0 + (temperature - config.hot_threshold) / config.hot_span
    } else if temperature < config.cold_threshold {
        (1.0 - (temperature - config.cold_threshold).abs() / config.cold_span).max(config.min_cold_factor)
    } else {
        1.0
    }
}

/// Chance of a critical effect per roll
///
/// Peaks at 0.09 with the default constants.
pub fn critical_chance(severity: f32, config: &StarvationConfig) -> f32 {
    if severity < config.critical_threshold {
        0.0
    } else {
        (severity - config.critical_threshold) * config.critical_chance_factor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarvationTrack {
    severity: f32,
    critical_timer: IntervalTimer,
}

impl StarvationTrack {
    pub fn new(initial: f32, now: Tick, config: &StarvationConfig) -> Self {
        Self {
            severity: initial.clamp(0.0, 1.0),
            critical_timer: IntervalTimer::armed_at(now + config.critical_check_interval),
        }
    }

    pub fn severity(&self) -> f32 {
        self.severity
    }

    /// Host override, clamped to [0, 1]
    pub fn set_severity(&mut self, severity: f32) {
        self.severity = severity.clamp(0.0, 1.0);
    }

    /// Feeding; returns true when hunger is gone and the track should be dropped
    pub fn feed(&mut self, amount: f32) -> bool {
        self.severity = (self.severity - amount.max(0.0)).max(0.0);
        self.severity <= 0.0
    }

    /// Advance one tick
    pub fn tick(
        &mut self,
        now: Tick,
        temperature: f32,
        rate_per_day: f32,
        config: &StarvationConfig,
        rng: &mut impl Rng,
    ) -> Option<StarvationEffect> {
        let delta = per_tick(rate_per_day) * temperature_factor(temperature, config);
        self.severity = (self.severity + delta).clamp(0.0, 1.0);

        if self.severity < config.critical_threshold || !self.critical_timer.is_due(now) {
            return None;
        }
        self.critical_timer.rearm(now, config.critical_check_interval);

        if rng.gen::<f32>() >= critical_chance(self.severity, config) {
            return None;
        }
        let roll: f32 = rng.gen();
        let effect = if roll < config.stun_weight {
            StarvationEffect::Stun
        } else if roll < config.stun_weight + config.frenzy_weight {
            StarvationEffect::Frenzy
        } else {
            StarvationEffect::SelfDamage
        };
        tracing::debug!("starvation critical effect {:?} at severity {:.2}", effect, self.severity);
        Some(effect)
    }
}
