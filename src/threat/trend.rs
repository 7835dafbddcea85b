//! Slowly drifting threat level with bounded history and a short forecast
//!
//! The value is `baseline + (2 × noise - 1) × amplitude`, scaled by the
//! environment and clamped to [0, 1]. Noise is sampled along a coarse time
//! axis so successive updates are correlated.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::clock::{TICKS_PER_DAY, TICKS_PER_HOUR};
use crate::core::config::TrendConfig;
use crate::core::types::Tick;
use crate::threat::environment::ThreatEnvironment;
use crate::threat::noise::perlin;

/// Upper bound (exclusive) of the random per-instance noise seed
const SEED_RANGE: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    pub tick: Tick,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatTrend {
    baseline: f32,
    amplitude: f32,
    current: f32,
    seed: f32,
    last_update: Option<Tick>,
    /// Environment multiplier from the last update, reused by forecasts
    last_multiplier: f32,
    history: VecDeque<TrendSample>,
}

impl ThreatTrend {
    pub fn new(config: &TrendConfig, rng: &mut impl Rng) -> Self {
        Self::with_seed(config, rng.gen_range(0.0..SEED_RANGE))
    }

    pub fn with_seed(config: &TrendConfig, seed: f32) -> Self {
        Self {
            baseline: config.baseline.clamp(0.0, 1.0),
            amplitude: config.amplitude.clamp(0.0, 1.0),
            current: config.baseline.clamp(0.0, 1.0),
            seed,
            last_update: None,
            last_multiplier: 1.0,
            history: VecDeque::with_capacity(config.history_length),
        }
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn seed(&self) -> f32 {
        self.seed
    }

    pub fn last_update(&self) -> Option<Tick> {
        self.last_update
    }

    /// Cached value from the last update
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Samples oldest first
    pub fn history(&self) -> impl Iterator<Item = &TrendSample> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Raw noise in [0, 1] at `tick`
    fn noise_at(&self, tick: Tick, config: &TrendConfig) -> f32 {
        let time_scale = tick as f32 / (TICKS_PER_DAY as f32 * config.noise_period_days);
        perlin(time_scale, self.seed)
    }

    fn value_at(&self, tick: Tick, multiplier: f32, config: &TrendConfig) -> f32 {
        let noise = self.noise_at(tick, config);
        ((self.baseline + (2.0 * noise - 1.0) * self.amplitude) * multiplier).clamp(0.0, 1.0)
    }

    /// Recompute if the update interval has elapsed; returns whether it did
    pub fn update(&mut self, now: Tick, env: &ThreatEnvironment, config: &TrendConfig) -> bool {
        if let Some(last) = self.last_update {
            if now.saturating_sub(last) < config.update_interval {
                return false;
            }
        }
        self.recompute(now, env, config);
        true
    }

    fn recompute(&mut self, now: Tick, env: &ThreatEnvironment, config: &TrendConfig) {
        self.last_multiplier = env.multiplier();
        self.current = self.value_at(now, self.last_multiplier, config);
        self.last_update = Some(now);

        self.history.push_back(TrendSample {
            tick: now,
            value: self.current,
        });
        while self.history.len() > config.history_length {
            self.history.pop_front();
        }
    }

    /// Fresh value relative to the update interval
    pub fn current_value(&mut self, now: Tick, env: &ThreatEnvironment, config: &TrendConfig) -> f32 {
        self.update(now, env, config);
        self.current
    }

    /// Hourly projections using today's environment for every step
    pub fn forecast(&self, now: Tick, steps: usize, config: &TrendConfig) -> Vec<TrendSample> {
        (1..=steps as Tick)
            .map(|i| {
                let tick = now + i * TICKS_PER_HOUR;
                TrendSample {
                    tick,
                    value: self.value_at(tick, self.last_multiplier, config),
                }
            })
            .collect()
    }

    /// Change the resting level and recompute immediately
    pub fn set_baseline(&mut self, baseline: f32, now: Tick, env: &ThreatEnvironment, config: &TrendConfig) {
        self.baseline = baseline.clamp(0.0, 1.0);
        self.recompute(now, env, config);
    }

    /// Change the swing and recompute immediately
    pub fn set_amplitude(&mut self, amplitude: f32, now: Tick, env: &ThreatEnvironment, config: &TrendConfig) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self.recompute(now, env, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WeatherKind;

    fn trend() -> ThreatTrend {
        ThreatTrend::with_seed(&TrendConfig::default(), 4321.7)
    }

    #[test]
    fn test_update_noop_within_interval() {
        let config = TrendConfig::default();
        let env = ThreatEnvironment::default();
        let mut t = trend();

        assert!(t.update(10_000, &env, &config));
        let first = t.value();
        assert!(!t.update(10_010, &env, &config));
        assert_eq!(t.value(), first);
        assert_eq!(t.history_len(), 1);
        assert!(t.update(10_900, &env, &config));
    }

    #[test]
    fn test_value_within_band() {
        let config = TrendConfig::default();
        let env = ThreatEnvironment::default();
        let mut t = trend();
        for step in 0..500u64 {
            let v = t.current_value(step * 900, &env, &config);
            assert!((0.1 - 1e-6..=0.9 + 1e-6).contains(&v), "{}", v);
        }
    }

    #[test]
    fn test_history_bounded() {
        let config = TrendConfig {
            history_length: 4,
            ..TrendConfig::default()
        };
        let env = ThreatEnvironment::default();
        let mut t = trend();
        for step in 0..10u64 {
            t.update(step * 1_000, &env, &config);
        }
        let ticks: Vec<Tick> = t.history().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![6_000, 7_000, 8_000, 9_000]);
    }

    #[test]
    fn test_environment_scales_and_clamps() {
        let config = TrendConfig {
            baseline: 1.0,
            amplitude: 0.0,
            ..TrendConfig::default()
        };
        let mut t = ThreatTrend::with_seed(&config, 1.0);
        let hot = ThreatEnvironment {
            temperature: 50.0,
            weather: WeatherKind::Thunderstorm,
            toxic_fallout: false,
        };
        assert_eq!(t.current_value(0, &hot, &config), 1.0);

        let frozen = ThreatEnvironment {
            temperature: -50.0,
            ..ThreatEnvironment::default()
        };
        t.set_baseline(0.8, 10, &frozen, &config);
        assert!((t.value() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_clamped_and_recomputed() {
        let config = TrendConfig {
            baseline: 0.5,
            amplitude: 0.0,
            ..TrendConfig::default()
        };
        let env = ThreatEnvironment::default();
        let mut t = ThreatTrend::with_seed(&config, 7.0);
        t.update(0, &env, &config);
        assert!((t.value() - 0.5).abs() < 1e-6);

        t.set_amplitude(3.0, 5, &env, &config);
        assert_eq!(t.amplitude(), 1.0);
        assert_eq!(t.history_len(), 2);
        assert!((0.0..=1.0).contains(&t.value()));
    }

    #[test]
    fn test_forecast_hourly_with_current_multiplier() {
        let config = TrendConfig::default();
        let env = ThreatEnvironment::default();
        let mut t = trend();
        t.update(0, &env, &config);

        let forecast = t.forecast(0, config.forecast_steps, &config);
        assert_eq!(forecast.len(), 8);
        assert_eq!(forecast[0].tick, TICKS_PER_HOUR);
        assert_eq!(forecast[7].tick, 8 * TICKS_PER_HOUR);
        // Forecast repeats the live computation for the same tick
        let mut later = t.clone();
        later.update(TICKS_PER_HOUR, &env, &config);
        assert!((later.value() - forecast[0].value).abs() < 1e-6);
    }
}
