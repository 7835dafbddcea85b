//! Turned agent state machine
//!
//! `Active` agents heal, hunt and leave residue. Cold pushes them into
//! `Hibernating`, where all of that stops until the temperature climbs back
//! above the threshold plus a margin.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::clock::IntervalTimer;
use crate::core::config::TurnedConfig;
use crate::core::types::{ComfortBand, FactionId, Tick};
use crate::host::ActionRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnedState {
    Active,
    Hibernating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnedBehavior {
    state: TurnedState,
    level: u32,
    /// Faction the agent belonged to before turning
    original_faction: Option<FactionId>,
    heal_timer: IntervalTimer,
    check_timer: IntervalTimer,
    turned_at: Tick,
}

/// Temperature below which a turned agent goes dormant
pub fn hibernation_threshold(comfort: ComfortBand, config: &TurnedConfig) -> f32 {
    comfort.min - config.hibernation_offset
}

/// Randomized check interval so agents created together do not scan on the same tick
pub fn jittered_interval(config: &TurnedConfig, rng: &mut impl Rng) -> Tick {
    rng.gen_range(config.check_interval_min..=config.check_interval_max)
}

impl TurnedBehavior {
    pub fn new(original_faction: Option<FactionId>, now: Tick, config: &TurnedConfig, rng: &mut impl Rng) -> Self {
        Self {
            state: TurnedState::Active,
            level: 1,
            original_faction,
            heal_timer: IntervalTimer::armed_at(now + config.healing_interval),
            check_timer: IntervalTimer::armed_at(now + jittered_interval(config, rng)),
            turned_at: now,
        }
    }

    pub fn state(&self) -> TurnedState {
        self.state
    }

    pub fn is_hibernating(&self) -> bool {
        self.state == TurnedState::Hibernating
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Levels never drop below 1
    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    pub fn original_faction(&self) -> Option<FactionId> {
        self.original_faction
    }

    pub fn turned_at(&self) -> Tick {
        self.turned_at
    }

    pub fn next_check(&self) -> Tick {
        self.check_timer.next_fire()
    }

    /// Level 1 bodies only fight at close range
    pub fn allows_action(&self, range: ActionRange) -> bool {
        match range {
            ActionRange::Melee => true,
            ActionRange::Ranged => self.level >= 2,
        }
    }

    /// Apply hysteresis to the ambient temperature
    ///
    /// Returns the new hibernation flag when the state changed.
    pub fn update_hibernation(&mut self, temperature: f32, comfort: ComfortBand, config: &TurnedConfig) -> Option<bool> {
        let threshold = hibernation_threshold(comfort, config);
        match self.state {
            TurnedState::Active if temperature < threshold => {
                self.state = TurnedState::Hibernating;
                Some(true)
            }
            TurnedState::Hibernating if temperature > threshold + config.hibernation_margin => {
                self.state = TurnedState::Active;
                Some(false)
            }
            _ => None,
        }
    }

    /// True when the heal pulse fires this tick; re-arms itself
    pub fn heal_due(&mut self, now: Tick, config: &TurnedConfig) -> bool {
        if !self.heal_timer.is_due(now) {
            return false;
        }
        self.heal_timer.rearm(now, config.healing_interval);
        true
    }

    /// True when the environment check fires this tick; re-arms with fresh jitter
    pub fn check_due(&mut self, now: Tick, config: &TurnedConfig, rng: &mut impl Rng) -> bool {
        if !self.check_timer.is_due(now) {
            return false;
        }
        self.check_timer.rearm(now, jittered_interval(config, rng));
        true
    }
}

/// Heal budget for one pulse after the starvation penalty
pub fn heal_amount(config: &TurnedConfig, starvation: Option<f32>) -> f32 {
    config.heal_amount * (1.0 - starvation.unwrap_or(0.0).clamp(0.0, 1.0))
}

/// Pick one open injury and return its new severity, never below zero
pub fn heal_one(injuries: &[f32], amount: f32, rng: &mut impl Rng) -> Option<(usize, f32)> {
    if injuries.is_empty() || amount <= 0.0 {
        return None;
    }
    let index = rng.gen_range(0..injuries.len());
    Some((index, (injuries[index] - amount).max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn behavior() -> TurnedBehavior {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        TurnedBehavior::new(Some(FactionId(1)), 0, &TurnedConfig::default(), &mut rng)
    }

    #[test]
    fn test_hibernation_hysteresis() {
        let config = TurnedConfig::default();
        let comfort = ComfortBand::new(16.0, 26.0);
        let threshold = hibernation_threshold(comfort, &config);
        let mut b = behavior();

        assert_eq!(b.update_hibernation(threshold - 1.0, comfort, &config), Some(true));
        let mut toggles = 0;
        for i in 0..100 {
            let t = if i % 2 == 0 { threshold + 1.0 } else { threshold - 1.0 };
            if b.update_hibernation(t, comfort, &config).is_some() {
                toggles += 1;
            }
        }
        assert_eq!(toggles, 0);
        assert!(b.is_hibernating());

        assert_eq!(b.update_hibernation(threshold + 2.5, comfort, &config), Some(false));
    }

    #[test]
    fn test_level_gates_ranged() {
        let mut b = behavior();
        assert!(b.allows_action(ActionRange::Melee));
        assert!(!b.allows_action(ActionRange::Ranged));
        b.set_level(2);
        assert!(b.allows_action(ActionRange::Ranged));
        b.set_level(0);
        assert_eq!(b.level(), 1);
    }

    #[test]
    fn test_check_jitter_within_bounds() {
        let config = TurnedConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..200 {
            let interval = jittered_interval(&config, &mut rng);
            assert!((300..=600).contains(&interval));
        }
    }

    #[test]
    fn test_timers_rearm() {
        let config = TurnedConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut b = behavior();
        assert!(!b.heal_due(60, &config));
        assert!(b.heal_due(61, &config));
        assert!(!b.heal_due(62, &config));

        let next = b.next_check();
        assert!(!b.check_due(next, &config, &mut rng));
        assert!(b.check_due(next + 1, &config, &mut rng));
        assert!(b.next_check() >= next + 301);
    }

    #[test]
    fn test_heal_respects_starvation_and_zero() {
        let config = TurnedConfig::default();
        assert!((heal_amount(&config, Some(0.5)) - 0.005).abs() < 1e-7);
        assert_eq!(heal_amount(&config, Some(1.0)), 0.0);

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (index, severity) = heal_one(&[0.004], 0.01, &mut rng).unwrap();
        assert_eq!(index, 0);
        assert_eq!(severity, 0.0);
        assert!(heal_one(&[], 0.01, &mut rng).is_none());
    }
}
